//! Values in flight between vertices.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A value emitted by one vertex for another during a signal phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal<I, P> {
    /// Identity of the emitting vertex.
    pub source: I,
    /// Identity of the vertex the value is destined for.
    pub target: I,
    /// The value itself.
    pub payload: P,
}

impl<I, P> Signal<I, P> {
    /// Creates a signal from `source` to `target` carrying `payload`.
    pub fn new(source: I, target: I, payload: P) -> Self {
        Signal { source, target, payload }
    }
}

/// Signals buffered for one vertex's next collect.
///
/// Most vertices see only a handful of signals per phase, so a few live inline.
pub type Signals<I, P> = SmallVec<[Signal<I, P>; 4]>;
