//! Parallel processing configuration for batch runs.

use ocr_ensemble_core::core::DEFAULT_PARALLEL_THRESHOLD;
use serde::{Deserialize, Serialize};

/// How a batch run spreads labels across threads.
///
/// Each label is one unit of work. Labels share no mutable state, so the only
/// knobs are the pool size and the batch size below which threads are not
/// worth starting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelPolicy {
    /// Maximum number of worker threads.
    /// If None, rayon picks its default (typically the number of CPU cores).
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Batches of at most this many labels run sequentially.
    /// Default: 1 (a single label never starts a pool)
    #[serde(default = "ParallelPolicy::default_label_threshold")]
    pub label_threshold: usize,
}

impl ParallelPolicy {
    /// Create a new ParallelPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of threads.
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the sequential label threshold.
    pub fn with_label_threshold(mut self, threshold: usize) -> Self {
        self.label_threshold = threshold;
        self
    }

    /// Builds a thread pool for one run.
    ///
    /// The pool is owned by the caller and dropped with it, so concurrent runs
    /// with different policies do not interfere through rayon's global pool.
    pub fn build_thread_pool(&self) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("ocr-ensemble-{i}"));
        if let Some(num_threads) = self.max_threads.filter(|&n| n > 0) {
            builder = builder.num_threads(num_threads);
        }
        builder.build()
    }

    /// Default value for the label threshold.
    fn default_label_threshold() -> usize {
        DEFAULT_PARALLEL_THRESHOLD
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_threads: None,
            label_threshold: Self::default_label_threshold(),
        }
    }
}
