//! Monotonic tallies of the operations a worker performs.

use serde::{Deserialize, Serialize};

/// Counts of everything a worker has done since construction.
///
/// Tallies only ever grow; `vertices_added - vertices_removed` equals the
/// store's size at all times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCounters {
    /// Vertices newly added to the store.
    pub vertices_added: u64,
    /// Vertices removed from the store.
    pub vertices_removed: u64,
    /// Outgoing edges attached to stored vertices.
    pub outgoing_edges_added: u64,
    /// Outgoing edges detached, including those removed with their vertex.
    pub outgoing_edges_removed: u64,
    /// Signal operations whose score cleared the threshold and ran.
    pub signal_operations_executed: u64,
    /// Collect operations whose score cleared the threshold and ran.
    pub collect_operations_executed: u64,
    /// Synchronous signal steps driven by the coordinator.
    pub signal_steps: u64,
    /// Synchronous collect steps driven by the coordinator.
    pub collect_steps: u64,
    /// Messages taken from the inbox.
    pub messages_received: u64,
}
