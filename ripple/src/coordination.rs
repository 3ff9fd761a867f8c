//! The control protocol between a worker and its coordinator.
//!
//! Control flows one way through the inbox: the coordinator (or anything else
//! holding a worker's mailbox) enqueues [`WorkerRequest`]s, and the worker
//! answers with [`CoordinatorMessage`]s over the bus. Requests are a closed set
//! of tagged variants rather than opaque closures, so every control-plane
//! operation is nameable and none requires dynamic dispatch to decode; the
//! inherently higher-order operations carry their predicates and folds as
//! explicit boxed payloads.

use serde::{Deserialize, Serialize};

use ripple_communication::{mailbox, Data, Inbox, Mailbox};

use crate::bus::MessageBus;
use crate::graph::{Edge, Signal, Vertex};
use crate::worker::OperationCounters;

/// Snapshot sent to the coordinator on every transition of a worker's
/// `is_idle` or `is_paused` state, and never otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    /// Index of the reporting worker.
    pub worker_id: usize,
    /// Whether the worker last timed out polling its inbox.
    pub is_idle: bool,
    /// Whether vertex processing is suspended.
    pub is_paused: bool,
    /// Messages the worker's bus endpoint has sent, excluding this one.
    pub messages_sent: u64,
    /// Messages the worker has taken from its inbox.
    pub messages_received: u64,
}

/// On-demand statistics describing a worker's shard and activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatistics {
    /// Index of the reporting worker.
    pub worker_id: usize,
    /// Messages the worker's bus endpoint has sent.
    pub messages_sent: u64,
    /// Messages the worker has taken from its inbox.
    pub messages_received: u64,
    /// Vertices currently stored.
    pub vertex_count: usize,
    /// Outgoing edges summed over the stored vertices.
    pub outgoing_edge_count: u64,
    /// Monotonic operation tallies.
    pub counters: OperationCounters,
}

/// Messages a worker sends to its coordinator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CoordinatorMessage {
    /// An `is_idle`/`is_paused` transition notification.
    Status(WorkerStatus),
    /// The answer to a [`WorkerRequest::ReportStatistics`].
    Statistics(WorkerStatistics),
}

/// Anything a worker can find in its inbox.
pub enum WorkerMessage<V: Vertex> {
    /// A signal routed to one of this worker's vertices.
    Signal(Signal<V::Id, V::Payload>),
    /// A control-plane request.
    Request(WorkerRequest<V>),
}

/// A predicate over vertices, sendable across worker boundaries.
pub type VertexPredicate<V> = Box<dyn Fn(&V) -> bool + Send>;

/// An edge constructor used by pattern-edge requests.
pub type EdgeFactory<V> = Box<dyn Fn(&V) -> Edge<<V as Vertex>::Id> + Send>;

/// Handler for signals whose target vertex is absent at collect time.
///
/// Installed per worker; the default handler drops the signal. The bus handle
/// lets a handler forward the signal elsewhere or request graph repairs.
pub type UndeliverableSignalHandler<V> =
    Box<dyn FnMut(Signal<<V as Vertex>::Id, <V as Vertex>::Payload>, &mut dyn MessageBus<V>) + Send>;

/// The fixed set of control-plane operations a worker accepts.
pub enum WorkerRequest<V: Vertex> {
    /// Add a vertex to this worker's shard.
    AddVertex(V),
    /// Attach an outgoing edge to its source vertex.
    AddEdge(Edge<V::Id>),
    /// Remove a vertex together with its outgoing edges.
    RemoveVertex(V::Id),
    /// Detach an outgoing edge from its source vertex.
    RemoveEdge(Edge<V::Id>),
    /// Attach an edge built by the factory to every vertex matching the predicate.
    AddPatternEdge(VertexPredicate<V>, EdgeFactory<V>),
    /// Remove every vertex matching the predicate.
    RemoveVertices(VertexPredicate<V>),
    /// Schedule every vertex for both phases.
    RecalculateScores,
    /// Schedule one vertex for both phases.
    RecalculateScoresFor(V::Id),
    /// Replace the signal-score threshold.
    SetSignalThreshold(f64),
    /// Replace the collect-score threshold.
    SetCollectThreshold(f64),
    /// Replace the undeliverable-signal handler.
    SetUndeliverableSignalHandler(UndeliverableSignalHandler<V>),
    /// Run one synchronous signal phase, acknowledging on the mailbox.
    SignalStep(Mailbox<()>),
    /// Run one synchronous collect phase, replying whether the worker is left
    /// with nothing scheduled to signal.
    CollectStep(Mailbox<bool>),
    /// Fold the shard's vertices through the supplied accumulator.
    Aggregate(Box<dyn VertexFold<V>>),
    /// Send [`CoordinatorMessage::Statistics`] to the coordinator.
    ReportStatistics,
    /// Resume vertex processing.
    Start,
    /// Suspend vertex processing; control messages are still served.
    Pause,
    /// Release storage and exit the event loop.
    Shutdown,
}

/// A type-erased fold over one worker's vertex shard.
///
/// Used by [`WorkerRequest::Aggregate`]: the worker feeds it every stored
/// vertex and then calls `finish`, which typically ships the folded value back
/// to whoever asked.
pub trait VertexFold<V: Vertex>: Send {
    /// Folds one vertex into the accumulator.
    fn accumulate(&mut self, vertex: &V);
    /// Invoked once after the last vertex.
    fn finish(self: Box<Self>);
}

/// A [`VertexFold`] combining extracted per-vertex values and replying on a
/// mailbox.
///
/// For a reproducible result the combiner must be associative and commutative;
/// vertices are folded in whatever order the store yields them.
pub struct AggregateRequest<R, E, C> {
    accumulator: Option<R>,
    extract: E,
    combine: C,
    reply: Mailbox<R>,
}

/// Creates an aggregation request and the inbox its result arrives on.
pub fn aggregate_request<V, R, E, C>(
    neutral: R,
    extract: E,
    combine: C,
) -> (AggregateRequest<R, E, C>, Inbox<R>)
where
    V: Vertex,
    R: Data,
    E: Fn(&V) -> R + Send,
    C: Fn(R, R) -> R + Send,
{
    let (reply, result) = mailbox();
    (AggregateRequest { accumulator: Some(neutral), extract, combine, reply }, result)
}

impl<V, R, E, C> VertexFold<V> for AggregateRequest<R, E, C>
where
    V: Vertex,
    R: Data,
    E: Fn(&V) -> R + Send,
    C: Fn(R, R) -> R + Send,
{
    fn accumulate(&mut self, vertex: &V) {
        let value = (self.extract)(vertex);
        let folded = self.accumulator.take().expect("accumulator always present");
        self.accumulator = Some((self.combine)(folded, value));
    }

    fn finish(mut self: Box<Self>) {
        if let Some(result) = self.accumulator.take() {
            self.reply.send(result);
        }
    }
}
