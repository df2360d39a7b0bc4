//! In-process counters for the front door

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::FetchResult;

#[derive(Debug, Default)]
pub struct Metrics {
    batches_accepted: AtomicU64,
    batches_rejected: AtomicU64,
    fetches_completed: AtomicU64,
    fetches_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_accepted(&self) {
        self.batches_accepted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "batches_accepted", "Metric incremented");
    }

    pub fn batch_rejected(&self) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "batches_rejected", "Metric incremented");
    }

    /// Tally a finished batch. Error results count as failed, everything
    /// else (non-2xx included) as completed.
    pub fn record_results(&self, results: &[FetchResult]) {
        let failed = results.iter().filter(|r| r.is_error()).count() as u64;
        let completed = results.len() as u64 - failed;
        self.fetches_completed.fetch_add(completed, Ordering::Relaxed);
        self.fetches_failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_accepted: self.batches_accepted.load(Ordering::Relaxed),
            batches_rejected: self.batches_rejected.load(Ordering::Relaxed),
            fetches_completed: self.fetches_completed.load(Ordering::Relaxed),
            fetches_failed: self.fetches_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub batches_accepted: u64,
    pub batches_rejected: u64,
    pub fetches_completed: u64,
    pub fetches_failed: u64,
}
