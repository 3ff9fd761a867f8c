//! Thread spawning for a group of workers.

use std::sync::Arc;
use std::thread;

/// Spawns one thread per builder, each running the supplied per-worker logic.
///
/// Each builder is moved into its worker's thread; this is how per-worker
/// resources (an inbox, a bus endpoint) reach the thread that owns them.
/// Construction of anything fallible should happen inside `logic`, before the
/// worker enters its event loop, so that configuration errors surface early.
///
/// The returned [`WorkerGuards`] can be `join`ed to retrieve the values the
/// workers produce; dropping it blocks until the workers are done.
pub fn initialize_from<B, T, F>(builders: Vec<B>, logic: F) -> Result<WorkerGuards<T>, String>
where
    B: Send + 'static,
    T: Send + 'static,
    F: Fn(usize, B) -> T + Send + Sync + 'static,
{
    let logic = Arc::new(logic);
    let mut guards = Vec::with_capacity(builders.len());
    for (index, builder) in builders.into_iter().enumerate() {
        let clone = Arc::clone(&logic);
        guards.push(
            thread::Builder::new()
                .name(format!("worker thread {}", index))
                .spawn(move || (*clone)(index, builder))
                .map_err(|e| format!("{:?}", e))?,
        );
    }

    Ok(WorkerGuards { guards })
}

/// Maintains `JoinHandle`s for worker threads.
pub struct WorkerGuards<T: Send + 'static> {
    guards: Vec<thread::JoinHandle<T>>,
}

impl<T: Send + 'static> WorkerGuards<T> {
    /// Waits on the worker threads and returns the results they produce.
    pub fn join(mut self) -> Vec<Result<T, String>> {
        self.guards
            .drain(..)
            .map(|guard| guard.join().map_err(|e| format!("{:?}", e)))
            .collect()
    }
}

impl<T: Send + 'static> Drop for WorkerGuards<T> {
    fn drop(&mut self) {
        for guard in self.guards.drain(..) {
            guard.join().expect("worker panic");
        }
    }
}
