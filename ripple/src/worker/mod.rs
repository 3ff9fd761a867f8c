//! The root of each single-threaded worker.

pub mod counters;

pub use counters::OperationCounters;

use std::time::Duration;

use log::warn;

use ripple_communication::Inbox;

use crate::bus::MessageBus;
use crate::configuration::Config;
use crate::coordination::{
    CoordinatorMessage, UndeliverableSignalHandler, VertexFold, WorkerMessage, WorkerRequest,
    WorkerStatistics, WorkerStatus,
};
use crate::graph::{Edge, Signals, Vertex};
use crate::storage::{ToCollect, ToSignal, VertexStore};

/// A `Worker` owns one shard of the vertex set and drives it through
/// alternating signal and collect phases until nothing remains scheduled.
///
/// Everything a worker owns — store, pending indices, counters, control
/// flags — lives on one thread. External code reaches a worker only by
/// enqueueing [`WorkerMessage`]s into its inbox; the worker observes its
/// control flags at loop boundaries, never preemptively.
///
/// A worker starts paused. It processes control messages while paused, and
/// begins vertex processing once a [`WorkerRequest::Start`] arrives.
pub struct Worker<V: Vertex, S: VertexStore<V>, B: MessageBus<V>> {
    index: usize,
    peers: usize,
    store: S,
    bus: B,
    inbox: Inbox<WorkerMessage<V>>,
    to_signal: ToSignal<V::Id>,
    to_collect: ToCollect<V::Id, V::Payload>,
    counters: OperationCounters,
    undeliverable: UndeliverableSignalHandler<V>,
    signal_threshold: f64,
    collect_threshold: f64,
    idle_timeout: Duration,
    is_idle: bool,
    is_paused: bool,
    should_start: bool,
    should_pause: bool,
    should_shutdown: bool,
}

impl<V, S, B> Worker<V, S, B>
where
    V: Vertex,
    S: VertexStore<V>,
    B: MessageBus<V>,
{
    /// Allocates a worker bound to a store, a bus endpoint, and an inbox.
    pub fn new(config: &Config, index: usize, store: S, bus: B, inbox: Inbox<WorkerMessage<V>>) -> Self {
        Worker {
            index,
            peers: config.workers,
            store,
            bus,
            inbox,
            to_signal: ToSignal::new(),
            to_collect: ToCollect::new(),
            counters: OperationCounters::default(),
            undeliverable: Box::new(|_signal, _bus| {}),
            signal_threshold: config.signal_threshold,
            collect_threshold: config.collect_threshold,
            idle_timeout: config.idle_timeout,
            is_idle: false,
            is_paused: true,
            should_start: false,
            should_pause: false,
            should_shutdown: false,
        }
    }

    /// Index of the worker among its peers.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of peer workers.
    pub fn peers(&self) -> usize {
        self.peers
    }

    /// The worker's operation tallies.
    pub fn counters(&self) -> &OperationCounters {
        &self.counters
    }

    /// Ids scheduled for the signal phase.
    pub fn pending_signal(&self) -> &ToSignal<V::Id> {
        &self.to_signal
    }

    /// Ids scheduled for the collect phase, with their buffered signals.
    pub fn pending_collect(&self) -> &ToCollect<V::Id, V::Payload> {
        &self.to_collect
    }

    /// True when no vertex on this worker requires further signal or collect
    /// work.
    pub fn is_converged(&self) -> bool {
        self.to_signal.is_empty() && self.to_collect.is_empty()
    }

    /// Runs the event loop until shutdown.
    ///
    /// Each iteration serves control traffic, then drains every id scheduled
    /// to signal, then walks a snapshot of the collect schedule; the inbox is
    /// drained between individual collects so late-arriving signals accumulate
    /// for the following iteration. When the worker is converged or paused,
    /// the iteration instead blocks on the inbox up to the idle timeout, and
    /// reports itself idle if nothing arrived.
    ///
    /// On shutdown the store's resources are released before returning.
    pub fn run(&mut self) {
        while !self.should_shutdown {
            self.handle_idling();
            if !self.is_paused {
                for id in self.to_signal.take() {
                    self.execute_signal_of_vertex(&id);
                }
                for (id, uncollected) in self.to_collect.take() {
                    self.process_inbox();
                    if self.execute_collect_of_vertex(&id, uncollected) {
                        self.execute_signal_of_vertex(&id);
                    }
                }
            }
        }
        self.store.cleanup();
    }

    /// Drains every currently available inbox message without blocking.
    pub fn process_inbox(&mut self) {
        while let Some(message) = self.inbox.try_recv() {
            self.process(message);
        }
    }

    fn handle_idling(&mut self) {
        if self.should_start {
            self.should_start = false;
            self.set_paused(false);
        } else if self.should_pause {
            self.should_pause = false;
            self.set_paused(true);
        }
        if self.is_converged() || self.is_paused {
            self.process_inbox_or_idle(self.idle_timeout);
        } else {
            self.process_inbox();
        }
    }

    fn process_inbox_or_idle(&mut self, timeout: Duration) {
        match self.inbox.poll(timeout) {
            Some(message) => {
                self.process(message);
                self.process_inbox();
            }
            None => {
                self.set_idle(true);
                match self.inbox.recv() {
                    Some(message) => self.process(message),
                    // Every mailbox is gone; nothing further can arrive.
                    None => self.should_shutdown = true,
                }
                if !self.should_shutdown {
                    self.set_idle(false);
                }
            }
        }
    }

    fn process(&mut self, message: WorkerMessage<V>) {
        self.counters.messages_received += 1;
        match message {
            WorkerMessage::Signal(signal) => self.to_collect.add_signal(signal),
            WorkerMessage::Request(request) => self.handle_request(request),
        }
    }

    fn handle_request(&mut self, request: WorkerRequest<V>) {
        match request {
            WorkerRequest::AddVertex(vertex) => self.add_vertex(vertex),
            WorkerRequest::AddEdge(edge) => self.add_edge(edge),
            WorkerRequest::RemoveVertex(id) => {
                self.remove_vertex(&id);
            }
            WorkerRequest::RemoveEdge(edge) => self.remove_edge(&edge),
            WorkerRequest::AddPatternEdge(matches, build) => self.add_pattern_edge(&matches, &build),
            WorkerRequest::RemoveVertices(predicate) => self.remove_vertices(&predicate),
            WorkerRequest::RecalculateScores => self.recalculate_scores(),
            WorkerRequest::RecalculateScoresFor(id) => self.recalculate_scores_for(&id),
            WorkerRequest::SetSignalThreshold(threshold) => self.set_signal_threshold(threshold),
            WorkerRequest::SetCollectThreshold(threshold) => self.set_collect_threshold(threshold),
            WorkerRequest::SetUndeliverableSignalHandler(handler) => {
                self.set_undeliverable_signal_handler(handler);
            }
            WorkerRequest::SignalStep(done) => {
                self.signal_step();
                done.send(());
            }
            WorkerRequest::CollectStep(reply) => {
                let converged = self.collect_step();
                reply.send(converged);
            }
            WorkerRequest::Aggregate(fold) => self.run_fold(fold),
            WorkerRequest::ReportStatistics => {
                let statistics = self.statistics();
                self.bus.send_to_coordinator(CoordinatorMessage::Statistics(statistics));
            }
            WorkerRequest::Start => self.should_start = true,
            WorkerRequest::Pause => self.should_pause = true,
            WorkerRequest::Shutdown => self.should_shutdown = true,
        }
    }

    /// Adds `vertex` to the store, running its insertion hook if newly added.
    pub fn add_vertex(&mut self, vertex: V) {
        let id = vertex.id();
        if self.store.insert(vertex) {
            self.counters.vertices_added += 1;
            if let Some(vertex) = self.store.get_mut(&id) {
                vertex.on_insert(&mut self.bus);
            }
            self.store.update_state(&id);
        }
    }

    /// Attaches `edge` to its source vertex and schedules the source for both
    /// phases. A missing source vertex is a warning, not an error.
    pub fn add_edge(&mut self, edge: Edge<V::Id>) {
        let source = edge.source.clone();
        let added = match self.store.get_mut(&source) {
            Some(vertex) => vertex.add_outgoing_edge(edge),
            None => {
                warn!("worker {}: no source vertex for edge {:?}", self.index, edge);
                return;
            }
        };
        if added {
            self.counters.outgoing_edges_added += 1;
            self.to_collect.add_vertex(source.clone());
            self.to_signal.add(source.clone());
            self.store.update_state(&source);
        }
    }

    /// Removes the vertex with `id` along with its outgoing edges, returning
    /// whether it was present.
    pub fn remove_vertex(&mut self, id: &V::Id) -> bool {
        match self.store.remove(id) {
            Some(mut vertex) => {
                let detached = vertex.outgoing_edge_count() + vertex.remove_all_outgoing_edges();
                self.counters.outgoing_edges_removed += detached as u64;
                self.counters.vertices_removed += 1;
                true
            }
            None => {
                warn!("worker {}: no vertex {:?} to remove", self.index, id);
                false
            }
        }
    }

    /// Detaches `edge` from its source vertex. A missing source vertex is a
    /// warning, not an error.
    pub fn remove_edge(&mut self, edge: &Edge<V::Id>) {
        let removed = match self.store.get_mut(&edge.source) {
            Some(vertex) => vertex.remove_outgoing_edge(edge),
            None => {
                warn!("worker {}: no source vertex for edge removal {:?}", self.index, edge);
                return;
            }
        };
        if removed {
            self.counters.outgoing_edges_removed += 1;
            self.store.update_state(&edge.source);
        }
    }

    /// Attaches an edge built by `build` to every vertex matching `matches`.
    pub fn add_pattern_edge(&mut self, matches: impl Fn(&V) -> bool, build: impl Fn(&V) -> Edge<V::Id>) {
        let mut edges = Vec::new();
        self.store.for_each(|vertex| {
            if matches(vertex) {
                edges.push(build(vertex));
            }
        });
        for edge in edges {
            self.add_edge(edge);
        }
    }

    /// Removes every vertex matching `predicate`.
    pub fn remove_vertices(&mut self, predicate: impl Fn(&V) -> bool) {
        let mut ids = Vec::new();
        self.store.for_each(|vertex| {
            if predicate(vertex) {
                ids.push(vertex.id());
            }
        });
        for id in ids {
            self.remove_vertex(&id);
        }
    }

    /// Schedules every stored vertex for both phases.
    pub fn recalculate_scores(&mut self) {
        let mut ids = Vec::new();
        self.store.for_each(|vertex| ids.push(vertex.id()));
        for id in ids {
            self.recalculate_scores_for(&id);
        }
    }

    /// Schedules the vertex with `id` for both phases.
    pub fn recalculate_scores_for(&mut self, id: &V::Id) {
        self.to_collect.add_vertex(id.clone());
        self.to_signal.add(id.clone());
    }

    /// Replaces the signal-score threshold.
    pub fn set_signal_threshold(&mut self, threshold: f64) {
        self.signal_threshold = threshold;
    }

    /// Replaces the collect-score threshold.
    pub fn set_collect_threshold(&mut self, threshold: f64) {
        self.collect_threshold = threshold;
    }

    /// Replaces the handler for signals whose target vertex is absent.
    pub fn set_undeliverable_signal_handler(&mut self, handler: UndeliverableSignalHandler<V>) {
        self.undeliverable = handler;
    }

    /// Runs one synchronous signal phase over every scheduled vertex,
    /// consuming the schedule.
    pub fn signal_step(&mut self) {
        self.counters.signal_steps += 1;
        for id in self.to_signal.take() {
            self.execute_signal_of_vertex(&id);
        }
    }

    /// Runs one synchronous collect phase over every scheduled vertex,
    /// consuming the schedule and scheduling each vertex whose collect ran for
    /// the next signal phase.
    ///
    /// Returns true when the worker is left with nothing scheduled to signal,
    /// i.e. this round reached a fixed point.
    pub fn collect_step(&mut self) -> bool {
        self.counters.collect_steps += 1;
        for (id, uncollected) in self.to_collect.take() {
            if self.execute_collect_of_vertex(&id, uncollected) {
                self.to_signal.add(id);
            }
        }
        self.to_signal.is_empty()
    }

    /// Folds `extract`ed values over every stored vertex.
    ///
    /// For a reproducible result `combine` must be associative and
    /// commutative; vertices are visited in whatever order the store yields
    /// them.
    pub fn aggregate<R>(&mut self, neutral: R, combine: impl Fn(R, R) -> R, extract: impl Fn(&V) -> R) -> R {
        let mut accumulator = Some(neutral);
        self.store.for_each(|vertex| {
            let value = extract(vertex);
            let folded = accumulator.take().expect("accumulator always present");
            accumulator = Some(combine(folded, value));
        });
        accumulator.expect("accumulator always present")
    }

    /// Applies `action` to the vertex with `id`, persisting any mutation.
    ///
    /// Returns `None` when no such vertex is stored here.
    pub fn with_vertex<R>(&mut self, id: &V::Id, action: impl FnOnce(&mut V) -> R) -> Option<R> {
        let result = self.store.get_mut(id).map(action);
        if result.is_some() {
            self.store.update_state(id);
        }
        result
    }

    /// Visits every stored vertex, in no particular order.
    pub fn for_each_vertex(&mut self, mut action: impl FnMut(&V)) {
        self.store.for_each(|vertex| action(vertex));
    }

    /// A statistics snapshot: bus and inbox counters, store size, and summed
    /// outgoing edges.
    pub fn statistics(&mut self) -> WorkerStatistics {
        let mut outgoing = 0u64;
        self.store.for_each(|vertex| outgoing += vertex.outgoing_edge_count() as u64);
        WorkerStatistics {
            worker_id: self.index,
            messages_sent: self.bus.messages_sent(),
            messages_received: self.counters.messages_received,
            vertex_count: self.store.len(),
            outgoing_edge_count: outgoing,
            counters: self.counters,
        }
    }

    fn run_fold(&mut self, mut fold: Box<dyn VertexFold<V>>) {
        self.store.for_each(|vertex| fold.accumulate(vertex));
        fold.finish();
    }

    fn execute_signal_of_vertex(&mut self, id: &V::Id) -> bool {
        let executed = match self.store.get_mut(id) {
            Some(vertex) if vertex.score_signal() > self.signal_threshold => {
                self.counters.signal_operations_executed += 1;
                vertex.signal(&mut self.bus);
                true
            }
            _ => false,
        };
        if executed {
            self.store.update_state(id);
        }
        executed
    }

    fn execute_collect_of_vertex(&mut self, id: &V::Id, uncollected: Signals<V::Id, V::Payload>) -> bool {
        let executed = match self.store.get_mut(id) {
            Some(vertex) => {
                if vertex.score_collect(&uncollected) > self.collect_threshold {
                    self.counters.collect_operations_executed += 1;
                    vertex.collect(uncollected, &mut self.bus);
                    true
                } else {
                    false
                }
            }
            None => {
                // The target has left this shard (or never lived here); hand
                // its signals over in arrival order.
                for signal in uncollected {
                    (self.undeliverable)(signal, &mut self.bus);
                }
                false
            }
        };
        if executed {
            self.store.update_state(id);
        }
        executed
    }

    fn set_paused(&mut self, paused: bool) {
        if self.is_paused != paused {
            self.is_paused = paused;
            self.emit_status();
        }
    }

    fn set_idle(&mut self, idle: bool) {
        if self.is_idle != idle {
            self.is_idle = idle;
            self.emit_status();
        }
    }

    // The snapshot is taken before the send, so a status's `messages_sent`
    // excludes the message carrying it.
    fn emit_status(&mut self) {
        let status = WorkerStatus {
            worker_id: self.index,
            is_idle: self.is_idle,
            is_paused: self.is_paused,
            messages_sent: self.bus.messages_sent(),
            messages_received: self.counters.messages_received,
        };
        self.bus.send_to_coordinator(CoordinatorMessage::Status(status));
    }
}
