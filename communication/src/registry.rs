//! Endpoint registration binding a worker group and its coordinator together.

use crate::{Data, Mailbox};

/// The mailboxes of every worker in a group, plus their coordinator's.
///
/// A directory is assembled once, before any worker starts, and then cloned
/// into each worker's bus endpoint. Registration is not expected after the
/// computation is underway; the directory is deliberately not shared state.
pub struct Directory<M, C> {
    workers: Vec<Option<Mailbox<M>>>,
    coordinator: Option<Mailbox<C>>,
}

impl<M, C> Clone for Directory<M, C> {
    fn clone(&self) -> Self {
        Directory {
            workers: self.workers.clone(),
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<M: Data, C: Data> Directory<M, C> {
    /// Creates a directory with `peers` unregistered worker slots.
    pub fn new(peers: usize) -> Self {
        Directory {
            workers: (0..peers).map(|_| None).collect(),
            coordinator: None,
        }
    }

    /// Registers the mailbox of worker `index`.
    pub fn register_worker(&mut self, index: usize, mailbox: Mailbox<M>) {
        assert!(index < self.workers.len(), "worker index {} out of bounds", index);
        self.workers[index] = Some(mailbox);
    }

    /// Registers the coordinator's mailbox.
    pub fn register_coordinator(&mut self, mailbox: Mailbox<C>) {
        self.coordinator = Some(mailbox);
    }

    /// The mailbox of worker `index`, if registered.
    pub fn worker(&self, index: usize) -> Option<&Mailbox<M>> {
        self.workers.get(index).and_then(|slot| slot.as_ref())
    }

    /// The coordinator's mailbox, if registered.
    pub fn coordinator(&self) -> Option<&Mailbox<C>> {
        self.coordinator.as_ref()
    }

    /// Number of worker slots.
    pub fn peers(&self) -> usize {
        self.workers.len()
    }
}

#[cfg(test)]
mod tests {

    use super::Directory;
    use crate::mailbox;

    #[test]
    fn routes_to_registered_workers() {
        let (mailbox_a, inbox_a) = mailbox();
        let mut directory = Directory::<u32, ()>::new(2);
        directory.register_worker(0, mailbox_a);

        directory.worker(0).map(|mailbox| mailbox.send(7));
        assert_eq!(inbox_a.try_recv(), Some(7));
        assert!(directory.worker(1).is_none());
        assert!(directory.worker(2).is_none());
        assert!(directory.coordinator().is_none());
    }
}
