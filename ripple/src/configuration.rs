//! Options consumed when workers are constructed.

use std::time::Duration;

/// Construction-time options for a group of workers.
///
/// Thresholds may be changed later at runtime through
/// [`WorkerRequest`](crate::coordination::WorkerRequest); the idle timeout may
/// not.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of workers sharing the vertex set.
    pub workers: usize,
    /// Score above which a vertex's signal operation runs.
    pub signal_threshold: f64,
    /// Score above which a vertex's collect operation runs.
    pub collect_threshold: f64,
    /// How long a converged or paused worker blocks on its inbox before
    /// reporting itself idle.
    pub idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workers: 1,
            signal_threshold: 0.001,
            collect_threshold: 0.0,
            idle_timeout: Duration::from_millis(5),
        }
    }
}

impl Config {
    /// A configuration for `workers` workers, other options at their defaults.
    pub fn with_workers(workers: usize) -> Self {
        Config { workers, ..Config::default() }
    }
}

#[cfg(feature = "getopts")]
impl Config {
    /// Constructs a configuration by parsing supplied text arguments.
    ///
    /// Most commonly, this uses `std::env::args()` as the supplied iterator.
    pub fn from_args<I: Iterator<Item = String>>(args: I) -> Result<Config, String> {
        let mut opts = getopts::Options::new();
        opts.optopt("w", "workers", "number of worker threads", "NUM");
        opts.optopt("s", "signal-threshold", "score above which signal operations run", "NUM");
        opts.optopt("c", "collect-threshold", "score above which collect operations run", "NUM");

        let matches = opts.parse(args).map_err(|e| format!("{:?}", e))?;

        let mut config = Config::default();
        if let Some(text) = matches.opt_str("w") {
            config.workers = text.parse().map_err(|e| format!("-w: {:?}", e))?;
        }
        if let Some(text) = matches.opt_str("s") {
            config.signal_threshold = text.parse().map_err(|e| format!("-s: {:?}", e))?;
        }
        if let Some(text) = matches.opt_str("c") {
            config.collect_threshold = text.parse().map_err(|e| format!("-c: {:?}", e))?;
        }
        if config.workers == 0 {
            return Err("at least one worker is required".to_owned());
        }
        Ok(config)
    }
}
