//! Stands up a group of workers from configuration and per-worker logic.

use std::sync::Arc;
use std::time::Duration;

use log::warn;

use ripple_communication::{initialize_from, mailbox, Directory, Inbox, Mailbox, WorkerGuards};

use crate::bus::{HashMapper, LocalBus, WorkerMapper};
use crate::configuration::Config;
use crate::coordination::{CoordinatorMessage, WorkerMessage, WorkerRequest};
use crate::graph::Vertex;
use crate::storage::InMemoryStore;
use crate::worker::Worker;

/// Spawns one thread per configured worker, each running `logic` on a freshly
/// built worker, and returns joinable guards together with the coordinator's
/// side of the wiring.
///
/// Stores and bus endpoints are built inside each worker's own thread, before
/// its event loop begins, so construction problems surface early and no
/// worker state is ever shared. Ids are spread across workers by hash; use
/// [`execute_with_mapper`] to control placement.
///
/// `logic` typically seeds nothing and immediately calls
/// [`Worker::run`](crate::worker::Worker::run), leaving graph construction to
/// coordinator requests.
///
/// # Examples
/// ```no_run
/// use ripple::{Config, execute};
/// # use ripple::{Edge, MessageBus, Signal, Signals, Vertex};
/// # struct Mine;
/// # impl Vertex for Mine {
/// #     type Id = u32;
/// #     type Payload = u64;
/// #     fn id(&self) -> u32 { 0 }
/// #     fn score_signal(&self) -> f64 { 0.0 }
/// #     fn score_collect(&self, _: &[Signal<u32, u64>]) -> f64 { 0.0 }
/// #     fn signal(&mut self, _: &mut dyn MessageBus<Self>) {}
/// #     fn collect(&mut self, _: Signals<u32, u64>, _: &mut dyn MessageBus<Self>) {}
/// #     fn add_outgoing_edge(&mut self, _: Edge<u32>) -> bool { false }
/// #     fn remove_outgoing_edge(&mut self, _: &Edge<u32>) -> bool { false }
/// #     fn remove_all_outgoing_edges(&mut self) -> usize { 0 }
/// #     fn outgoing_edge_count(&self) -> usize { 0 }
/// # }
///
/// let (guards, coordinator) = execute::<Mine, _, _>(Config::with_workers(2), |worker| {
///     worker.run();
/// })
/// .unwrap();
/// ```
pub fn execute<V, T, F>(config: Config, logic: F) -> Result<(WorkerGuards<T>, Coordinator<V>), String>
where
    V: Vertex,
    T: Send + 'static,
    F: Fn(&mut Worker<V, InMemoryStore<V>, LocalBus<V>>) -> T + Send + Sync + 'static,
{
    if config.workers == 0 {
        return Err("at least one worker is required".to_owned());
    }
    let mapper = Arc::new(HashMapper::new(config.workers));
    execute_with_mapper(config, mapper, logic)
}

/// As [`execute`], with an explicit vertex-to-worker mapping.
pub fn execute_with_mapper<V, T, F>(
    config: Config,
    mapper: Arc<dyn WorkerMapper<V::Id>>,
    logic: F,
) -> Result<(WorkerGuards<T>, Coordinator<V>), String>
where
    V: Vertex,
    T: Send + 'static,
    F: Fn(&mut Worker<V, InMemoryStore<V>, LocalBus<V>>) -> T + Send + Sync + 'static,
{
    if config.workers == 0 {
        return Err("at least one worker is required".to_owned());
    }

    let mut mailboxes = Vec::with_capacity(config.workers);
    let mut inboxes = Vec::with_capacity(config.workers);
    for _ in 0..config.workers {
        let (worker_mailbox, worker_inbox) = mailbox();
        mailboxes.push(worker_mailbox);
        inboxes.push(worker_inbox);
    }
    let (coordinator_mailbox, coordinator_inbox) = mailbox();

    let mut directory = Directory::new(config.workers);
    for (index, worker_mailbox) in mailboxes.iter().enumerate() {
        directory.register_worker(index, worker_mailbox.clone());
    }
    directory.register_coordinator(coordinator_mailbox);

    let builders = inboxes
        .into_iter()
        .enumerate()
        .map(|(index, inbox)| {
            let bus = LocalBus::new(index, directory.clone(), Arc::clone(&mapper));
            (inbox, bus)
        })
        .collect::<Vec<_>>();

    let worker_config = config;
    let guards = initialize_from(builders, move |index, (inbox, bus)| {
        let mut worker = Worker::new(&worker_config, index, InMemoryStore::new(), bus, inbox);
        logic(&mut worker)
    })?;

    Ok((guards, Coordinator { workers: mailboxes, inbox: coordinator_inbox }))
}

/// Builds a single worker and executes `logic` against it on the calling
/// thread.
///
/// No threads are spawned and no coordinator is registered: status messages
/// are dropped, and the caller drives the worker synchronously, typically in
/// explicit signal/collect steps. Most useful in examples and tests.
pub fn execute_directly<V, T, F>(logic: F) -> T
where
    V: Vertex,
    F: FnOnce(&mut Worker<V, InMemoryStore<V>, LocalBus<V>>) -> T,
{
    let (worker_mailbox, worker_inbox) = mailbox();
    let mut directory = Directory::new(1);
    directory.register_worker(0, worker_mailbox);
    let bus = LocalBus::new(0, directory, Arc::new(HashMapper::new(1)));
    let mut worker = Worker::new(&Config::default(), 0, InMemoryStore::new(), bus, worker_inbox);
    logic(&mut worker)
}

/// The coordinator-facing side of a running computation.
///
/// The coordinator itself is not part of this crate; this handle is what one
/// would be built on: per-worker request mailboxes and the inbox worker
/// statuses and statistics arrive on.
pub struct Coordinator<V: Vertex> {
    workers: Vec<Mailbox<WorkerMessage<V>>>,
    inbox: Inbox<CoordinatorMessage>,
}

impl<V: Vertex> Coordinator<V> {
    /// Number of workers in the computation.
    pub fn peers(&self) -> usize {
        self.workers.len()
    }

    /// Sends `request` to worker `index`, indicating whether it was accepted.
    pub fn send(&self, index: usize, request: WorkerRequest<V>) -> bool {
        match self.workers.get(index) {
            Some(worker_mailbox) => worker_mailbox.send(WorkerMessage::Request(request)),
            None => {
                warn!("coordinator: no worker {} to send to", index);
                false
            }
        }
    }

    /// Sends one request per worker, built by `requests` from the worker index.
    pub fn broadcast(&self, requests: impl Fn(usize) -> WorkerRequest<V>) {
        for index in 0..self.workers.len() {
            self.send(index, requests(index));
        }
    }

    /// A clone of worker `index`'s mailbox, for wiring external producers.
    pub fn worker_mailbox(&self, index: usize) -> Option<Mailbox<WorkerMessage<V>>> {
        self.workers.get(index).cloned()
    }

    /// Waits up to `timeout` for the next worker message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<CoordinatorMessage> {
        self.inbox.poll(timeout)
    }

    /// Takes every currently available worker message without blocking.
    pub fn drain(&self) -> Vec<CoordinatorMessage> {
        let mut messages = Vec::new();
        while let Some(message) = self.inbox.try_recv() {
            messages.push(message);
        }
        messages
    }
}
