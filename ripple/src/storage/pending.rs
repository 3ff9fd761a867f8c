//! Pending-work indices: which vertices still owe a signal or a collect.
//!
//! Both indices are single-threaded structures owned by the worker's event
//! loop. Consuming iteration is expressed as `take`: the caller snapshots the
//! index and walks the snapshot, while anything scheduled mid-walk accumulates
//! in the (now empty) live index for the next pass.

use std::collections::{HashMap, HashSet};
use std::mem;

use crate::graph::{Payload, Signal, Signals, VertexId};

/// Ids of vertices scheduled for the signal phase.
pub struct ToSignal<I> {
    ids: HashSet<I>,
}

impl<I: VertexId> ToSignal<I> {
    /// Creates an empty index.
    pub fn new() -> Self {
        ToSignal { ids: HashSet::new() }
    }

    /// Schedules `id`; scheduling twice is the same as scheduling once.
    pub fn add(&mut self, id: I) {
        self.ids.insert(id);
    }

    /// Unschedules `id`, returning whether it was scheduled.
    pub fn remove(&mut self, id: &I) -> bool {
        self.ids.remove(id)
    }

    /// Whether `id` is scheduled.
    pub fn contains(&self, id: &I) -> bool {
        self.ids.contains(id)
    }

    /// Consumes the scheduled set, leaving the index empty.
    pub fn take(&mut self) -> HashSet<I> {
        mem::take(&mut self.ids)
    }

    /// True when nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of scheduled ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl<I: VertexId> Default for ToSignal<I> {
    fn default() -> Self {
        ToSignal::new()
    }
}

/// Ids of vertices scheduled for the collect phase, each with the signals
/// awaiting delivery to it.
pub struct ToCollect<I, P> {
    pending: HashMap<I, Signals<I, P>>,
}

impl<I: VertexId, P: Payload> ToCollect<I, P> {
    /// Creates an empty index.
    pub fn new() -> Self {
        ToCollect { pending: HashMap::new() }
    }

    /// Schedules `id` with no signals: its next collect runs on an empty batch.
    ///
    /// If `id` is already scheduled its buffered signals are untouched.
    pub fn add_vertex(&mut self, id: I) {
        self.pending.entry(id).or_default();
    }

    /// Buffers `signal` for its target, scheduling the target if necessary.
    pub fn add_signal(&mut self, signal: Signal<I, P>) {
        self.pending.entry(signal.target.clone()).or_default().push(signal);
    }

    /// Unschedules `id`, returning any signals buffered for it.
    pub fn remove(&mut self, id: &I) -> Option<Signals<I, P>> {
        self.pending.remove(id)
    }

    /// Whether `id` is scheduled.
    pub fn contains(&self, id: &I) -> bool {
        self.pending.contains_key(id)
    }

    /// Consumes the scheduled batch, leaving the index empty.
    ///
    /// Signals arriving while the caller walks the snapshot land in the live
    /// index and are delivered on the following pass.
    pub fn take(&mut self) -> HashMap<I, Signals<I, P>> {
        mem::take(&mut self.pending)
    }

    /// Unschedules everything, dropping any buffered signals.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// True when nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of scheduled ids.
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

impl<I: VertexId, P: Payload> Default for ToCollect<I, P> {
    fn default() -> Self {
        ToCollect::new()
    }
}

#[cfg(test)]
mod tests {

    use super::{ToCollect, ToSignal};
    use crate::graph::Signal;

    #[test]
    fn to_signal_take_consumes() {
        let mut index = ToSignal::new();
        index.add(1u32);
        index.add(2);
        index.add(1);
        assert_eq!(index.len(), 2);

        let taken = index.take();
        assert!(taken.contains(&1) && taken.contains(&2));
        assert!(index.is_empty());
    }

    #[test]
    fn to_collect_auto_creates_entries() {
        let mut index = ToCollect::new();
        index.add_signal(Signal::new(1u32, 3u32, 0.5f64));
        index.add_signal(Signal::new(2, 3, 0.25));
        index.add_vertex(4);

        assert!(index.contains(&3));
        assert!(index.contains(&4));
        assert_eq!(index.len(), 2);

        let buffered = index.remove(&3).unwrap();
        assert_eq!(buffered.len(), 2);
        // arrival order is preserved per target
        assert_eq!(buffered[0].source, 1);
        assert_eq!(buffered[1].source, 2);
        assert_eq!(index.remove(&4).map(|signals| signals.len()), Some(0));
    }

    #[test]
    fn add_vertex_keeps_buffered_signals() {
        let mut index = ToCollect::new();
        index.add_signal(Signal::new(1u32, 2u32, 1u64));
        index.add_vertex(2);
        assert_eq!(index.remove(&2).map(|signals| signals.len()), Some(1));
    }
}
