//! Single-consumer message queues with timed polling.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::warn;

use crate::Data;

/// Allocates a connected `Mailbox`/`Inbox` pair.
///
/// The queue is unbounded; senders never block. Backpressure, if any, is the
/// business of whoever produces into the mailbox.
pub fn mailbox<M: Data>() -> (Mailbox<M>, Inbox<M>) {
    let (sender, receiver) = unbounded();
    (Mailbox { sender }, Inbox { receiver })
}

/// The sending half of a message queue.
///
/// Cloneable, so any number of producers may deliver into the same inbox.
pub struct Mailbox<M> {
    sender: Sender<M>,
}

impl<M> Clone for Mailbox<M> {
    fn clone(&self) -> Self {
        Mailbox { sender: self.sender.clone() }
    }
}

impl<M: Data> Mailbox<M> {
    /// Delivers `message`, indicating whether the receiving end still exists.
    ///
    /// A message sent to a departed receiver is dropped with a warning rather
    /// than treated as an error; the receiver owns its own lifetime.
    pub fn send(&self, message: M) -> bool {
        match self.sender.send(message) {
            Ok(()) => true,
            Err(_) => {
                warn!("mailbox disconnected; dropping message");
                false
            }
        }
    }
}

/// The receiving half of a message queue; single consumer.
pub struct Inbox<M> {
    receiver: Receiver<M>,
}

impl<M: Data> Inbox<M> {
    /// Takes the next message without blocking.
    pub fn try_recv(&self) -> Option<M> {
        self.receiver.try_recv().ok()
    }

    /// Waits up to `timeout` for a message.
    ///
    /// Returns `None` both on timeout and when every mailbox has been dropped;
    /// a subsequent [`recv`](Inbox::recv) distinguishes the two.
    pub fn poll(&self, timeout: Duration) -> Option<M> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Blocks until a message arrives, or returns `None` once every mailbox
    /// has been dropped and the queue is drained.
    pub fn recv(&self) -> Option<M> {
        self.receiver.recv().ok()
    }

    /// Number of messages currently queued.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True when no messages are queued.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {

    use std::time::{Duration, Instant};

    use super::mailbox;

    #[test]
    fn delivers_in_order() {
        let (mailbox, inbox) = mailbox();
        for number in 0..10 {
            mailbox.send(number);
        }
        for number in 0..10 {
            assert_eq!(inbox.try_recv(), Some(number));
        }
        assert_eq!(inbox.try_recv(), None::<i32>);
    }

    #[test]
    fn poll_times_out() {
        let (_mailbox, inbox) = mailbox::<u32>();
        let start = Instant::now();
        assert_eq!(inbox.poll(Duration::from_millis(10)), None);
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn disconnect_surfaces_as_none() {
        let (mailbox, inbox) = mailbox();
        mailbox.send(1u32);
        drop(mailbox);
        assert_eq!(inbox.recv(), Some(1));
        assert_eq!(inbox.recv(), None);
    }

    #[test]
    fn send_to_departed_receiver_reports_failure() {
        let (mailbox, inbox) = mailbox();
        drop(inbox);
        assert!(!mailbox.send(1u32));
    }
}
