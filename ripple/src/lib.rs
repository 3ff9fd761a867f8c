//! Ripple executes graph computations written in the Signal/Collect style.
//!
//! A computation is expressed from the perspective of the vertices: each
//! vertex *signals* along its outgoing edges and *collects* the signals that
//! arrive, mutating its own state. Both operations are gated by floating-point
//! scores, so a vertex that has nothing new to say simply scores itself out of
//! the schedule. The graph is sharded across workers; each [`worker::Worker`]
//! owns its shard outright and runs a single-threaded event loop interleaving
//! inbound message processing with signal and collect execution, reporting
//! idle and pause transitions to a coordinator for global quiescence
//! detection.
//!
//! The code is organized in crates and modules that are meant to depend as
//! little as possible on each other:
//!
//! **Communication**: the [`ripple_communication`] crate defines the mailbox,
//! inbox, and directory primitives workers use to reach each other and their
//! coordinator.
//!
//! **Graph model**: the [`graph`] module defines the [`Vertex`] contract and
//! the [`Edge`] and [`Signal`] value types the engine moves around.
//!
//! **Storage**: the [`storage`] module defines the vertex store owned by each
//! worker and the pending-work indices recording which vertices still owe a
//! signal or a collect.
//!
//! **Worker runtime**: the [`worker`] module defines the event loop,
//! threshold-gated operation execution, and the control-plane operations a
//! coordinator may request; [`execute`](crate::execute()) stands workers up.
//!
//! # Examples
//!
//! The following computes shortest path lengths from a root vertex, driving a
//! single worker synchronously in alternating phases.
//!
//! ```
//! use ripple::{execute_directly, Edge, MessageBus, Signal, Signals, Vertex};
//!
//! // A vertex whose state is its best known distance from the root.
//! struct Location {
//!     id: u32,
//!     state: u64,
//!     last_signaled: Option<u64>,
//!     edges: Vec<Edge<u32>>,
//! }
//!
//! impl Vertex for Location {
//!     type Id = u32;
//!     type Payload = u64;
//!
//!     fn id(&self) -> u32 { self.id }
//!
//!     // Signal whenever the last announced distance is out of date.
//!     fn score_signal(&self) -> f64 {
//!         if self.last_signaled == Some(self.state) { 0.0 } else { 1.0 }
//!     }
//!
//!     fn score_collect(&self, uncollected: &[Signal<u32, u64>]) -> f64 {
//!         uncollected.len() as f64
//!     }
//!
//!     fn signal(&mut self, bus: &mut dyn MessageBus<Self>) {
//!         for edge in &self.edges {
//!             bus.send_signal(Signal::new(self.id, edge.target, self.state.saturating_add(1)));
//!         }
//!         self.last_signaled = Some(self.state);
//!     }
//!
//!     fn collect(&mut self, uncollected: Signals<u32, u64>, _bus: &mut dyn MessageBus<Self>) {
//!         for signal in uncollected {
//!             self.state = self.state.min(signal.payload);
//!         }
//!     }
//!
//!     fn add_outgoing_edge(&mut self, edge: Edge<u32>) -> bool {
//!         if self.edges.contains(&edge) {
//!             false
//!         } else {
//!             self.edges.push(edge);
//!             true
//!         }
//!     }
//!
//!     fn remove_outgoing_edge(&mut self, edge: &Edge<u32>) -> bool {
//!         let before = self.edges.len();
//!         self.edges.retain(|e| e != edge);
//!         self.edges.len() < before
//!     }
//!
//!     fn remove_all_outgoing_edges(&mut self) -> usize {
//!         let removed = self.edges.len();
//!         self.edges.clear();
//!         removed
//!     }
//!
//!     fn outgoing_edge_count(&self) -> usize { self.edges.len() }
//! }
//!
//! fn location(id: u32, state: u64) -> Location {
//!     Location { id, state, last_signaled: None, edges: Vec::new() }
//! }
//!
//! let farthest = execute_directly(|worker| {
//!     worker.add_vertex(location(1, 0));
//!     worker.add_vertex(location(2, u64::MAX));
//!     worker.add_vertex(location(3, u64::MAX));
//!     worker.add_edge(Edge::plain(1, 2));
//!     worker.add_edge(Edge::plain(2, 3));
//!
//!     loop {
//!         worker.signal_step();
//!         worker.process_inbox();
//!         if worker.collect_step() {
//!             break;
//!         }
//!     }
//!     worker.aggregate(0, std::cmp::max, |v| v.state)
//! });
//!
//! assert_eq!(farthest, 2);
//! ```

#![forbid(missing_docs)]

pub mod bus;
pub mod configuration;
pub mod coordination;
pub mod execute;
pub mod graph;
pub mod storage;
pub mod worker;

pub use bus::{HashMapper, LocalBus, MessageBus, WorkerMapper};
pub use configuration::Config;
pub use coordination::{
    CoordinatorMessage, WorkerMessage, WorkerRequest, WorkerStatistics, WorkerStatus,
};
pub use execute::{execute, execute_directly, execute_with_mapper, Coordinator};
pub use graph::{Edge, Payload, Signal, Signals, Vertex, VertexId};
pub use worker::{OperationCounters, Worker};

/// Re-export of the `ripple_communication` crate.
pub mod communication {
    pub use ripple_communication::*;
}
