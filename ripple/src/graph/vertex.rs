//! The vertex contract: scoring, signaling, collecting, and edge ownership.

use crate::bus::MessageBus;

use super::{Edge, Payload, Signal, Signals, VertexId};

/// A graph vertex driven through alternating signal and collect phases.
///
/// The worker never invokes [`signal`](Vertex::signal) or
/// [`collect`](Vertex::collect) directly; each is gated by its score. A vertex
/// signals only while `score_signal()` exceeds the worker's signal threshold,
/// and collects only while `score_collect(..)` exceeds the collect threshold.
/// A vertex that wants to fall quiet simply lets its scores drop.
///
/// Vertex logic is trusted: the worker does not catch panics out of it.
pub trait Vertex: Send + 'static {
    /// Stable identity type; unique per vertex across the whole graph.
    type Id: VertexId;
    /// Payload carried by signals between vertices of this graph.
    type Payload: Payload;

    /// The vertex's stable identity.
    fn id(&self) -> Self::Id;

    /// How much this vertex wants to signal.
    fn score_signal(&self) -> f64;

    /// How much this vertex wants to collect, given its queued signals.
    ///
    /// `uncollected` may be empty: a vertex can be scheduled for collect
    /// without any signals pending, for instance after an edge was attached.
    fn score_collect(&self, uncollected: &[Signal<Self::Id, Self::Payload>]) -> f64;

    /// Emits signals to other vertices through `bus`.
    fn signal(&mut self, bus: &mut dyn MessageBus<Self>)
    where
        Self: Sized;

    /// Consumes queued signals, updating this vertex's state.
    ///
    /// Signals appear in arrival order. The operation may itself emit signals.
    fn collect(&mut self, uncollected: Signals<Self::Id, Self::Payload>, bus: &mut dyn MessageBus<Self>)
    where
        Self: Sized;

    /// One-shot hook invoked when the vertex first enters a worker's store.
    fn on_insert(&mut self, _bus: &mut dyn MessageBus<Self>)
    where
        Self: Sized,
    {
    }

    /// Attaches an outgoing edge; false if an equal edge is already present.
    fn add_outgoing_edge(&mut self, edge: Edge<Self::Id>) -> bool;

    /// Detaches the given outgoing edge; false if it was not present.
    fn remove_outgoing_edge(&mut self, edge: &Edge<Self::Id>) -> bool;

    /// Detaches every outgoing edge, returning how many were removed.
    fn remove_all_outgoing_edges(&mut self) -> usize;

    /// Number of outgoing edges currently attached.
    fn outgoing_edge_count(&self) -> usize;
}
