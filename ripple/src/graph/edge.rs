//! Directed edges, owned by their source vertices.

use serde::{Deserialize, Serialize};

/// A directed connection from one vertex to another.
///
/// The triple of source, target, and kind identifies an edge; a vertex holds at
/// most one edge per triple. Edges carry no behavior of their own; what flows
/// along them is decided by the source vertex's signal operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge<I> {
    /// Identity of the owning vertex.
    pub source: I,
    /// Identity of the vertex the edge points at.
    pub target: I,
    /// Application tag distinguishing parallel edges.
    pub kind: String,
}

impl<I> Edge<I> {
    /// Creates an edge from `source` to `target` with the given kind tag.
    pub fn new(source: I, target: I, kind: impl Into<String>) -> Self {
        Edge { source, target, kind: kind.into() }
    }

    /// Creates an edge with the empty kind tag.
    pub fn plain(source: I, target: I) -> Self {
        Edge::new(source, target, "")
    }
}
