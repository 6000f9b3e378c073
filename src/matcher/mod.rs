pub mod types;
pub mod distance;
pub mod scoring;
pub mod engine;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use engine::SearchEngine;
pub use types::{Match, MatchSet, RunStatus, SearchParams};

/// Cooperative cancellation flag checked between work partitions. A
/// cancelled run returns an error and persists nothing.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
