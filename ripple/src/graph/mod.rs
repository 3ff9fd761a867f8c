//! Vertices, edges, and the signals exchanged between them.

pub mod edge;
pub mod signal;
pub mod vertex;

pub use edge::Edge;
pub use signal::{Signal, Signals};
pub use vertex::Vertex;

use std::fmt::Debug;
use std::hash::Hash;

use ripple_communication::Data;

/// A composite trait for types that identify vertices.
pub trait VertexId: Data + Clone + Eq + Hash + Debug {}
impl<T: Data + Clone + Eq + Hash + Debug> VertexId for T {}

/// A composite trait for the payloads signals carry.
pub trait Payload: Data + Clone + Debug {}
impl<T: Data + Clone + Debug> Payload for T {}
