//! Routing of signals and control messages between workers and the coordinator.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::{debug, warn};

use ripple_communication::{Directory, Mailbox};

use crate::coordination::{CoordinatorMessage, WorkerMessage, WorkerRequest};
use crate::graph::{Signal, Vertex};

/// The transport seam between a worker, its peers, and the coordinator.
///
/// Vertex logic receives a bus handle during its signal and collect operations
/// and emits through it; the worker itself uses the same handle for status
/// traffic. Delivery is in order per source-destination pair; nothing here
/// deduplicates.
pub trait MessageBus<V: Vertex> {
    /// Routes `signal` to the worker owning its target vertex.
    fn send_signal(&mut self, signal: Signal<V::Id, V::Payload>);

    /// Sends a control-plane request to a specific worker.
    fn send_request(&mut self, worker: usize, request: WorkerRequest<V>);

    /// Sends a message to the coordinator.
    fn send_to_coordinator(&mut self, message: CoordinatorMessage);

    /// Messages sent through this endpoint so far.
    fn messages_sent(&self) -> u64;
}

/// A pure mapping from vertex id to owning worker.
pub trait WorkerMapper<I>: Send + Sync {
    /// Index of the worker owning `id`'s vertex.
    fn worker_for(&self, id: &I) -> usize;
}

/// The default mapper, spreading ids across workers by hash.
#[derive(Clone, Copy, Debug)]
pub struct HashMapper {
    peers: usize,
}

impl HashMapper {
    /// Creates a mapper over `peers` workers.
    pub fn new(peers: usize) -> Self {
        assert!(peers > 0, "at least one worker is required");
        HashMapper { peers }
    }
}

impl<I: Hash> WorkerMapper<I> for HashMapper {
    fn worker_for(&self, id: &I) -> usize {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        (hasher.finish() % self.peers as u64) as usize
    }
}

/// An in-process bus endpoint delivering into registered worker mailboxes.
///
/// Each worker owns one endpoint; the directory inside is that worker's
/// private copy, so sends never contend on shared state.
pub struct LocalBus<V: Vertex> {
    index: usize,
    directory: Directory<WorkerMessage<V>, CoordinatorMessage>,
    mapper: Arc<dyn WorkerMapper<V::Id>>,
    sent: u64,
}

impl<V: Vertex> LocalBus<V> {
    /// Creates the bus endpoint of worker `index`.
    pub fn new(
        index: usize,
        directory: Directory<WorkerMessage<V>, CoordinatorMessage>,
        mapper: Arc<dyn WorkerMapper<V::Id>>,
    ) -> Self {
        LocalBus { index, directory, mapper, sent: 0 }
    }

    /// Registers the mailbox of worker `worker` with this endpoint.
    pub fn register_worker(&mut self, worker: usize, mailbox: Mailbox<WorkerMessage<V>>) {
        self.directory.register_worker(worker, mailbox);
    }

    /// Registers the coordinator's mailbox with this endpoint.
    pub fn register_coordinator(&mut self, mailbox: Mailbox<CoordinatorMessage>) {
        self.directory.register_coordinator(mailbox);
    }

    /// Index of the worker owning this endpoint.
    pub fn index(&self) -> usize {
        self.index
    }

    fn deliver(&mut self, worker: usize, message: WorkerMessage<V>) {
        match self.directory.worker(worker) {
            Some(mailbox) => {
                self.sent += 1;
                mailbox.send(message);
            }
            None => warn!("worker {}: no worker {} registered; dropping message", self.index, worker),
        }
    }
}

impl<V: Vertex> MessageBus<V> for LocalBus<V> {
    fn send_signal(&mut self, signal: Signal<V::Id, V::Payload>) {
        let target = self.mapper.worker_for(&signal.target);
        self.deliver(target, WorkerMessage::Signal(signal));
    }

    fn send_request(&mut self, worker: usize, request: WorkerRequest<V>) {
        self.deliver(worker, WorkerMessage::Request(request));
    }

    fn send_to_coordinator(&mut self, message: CoordinatorMessage) {
        match self.directory.coordinator() {
            Some(mailbox) => {
                self.sent += 1;
                mailbox.send(message);
            }
            None => debug!("worker {}: no coordinator registered; dropping {:?}", self.index, message),
        }
    }

    fn messages_sent(&self) -> u64 {
        self.sent
    }
}
