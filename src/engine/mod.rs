//! Fetch orchestration engine
//!
//! A batch of URLs becomes one [`Task`] per URL. Every task is submitted to
//! the shared [`WorkerPool`] by its own waiter, and the batch returns once
//! every waiter has its result. Results come back in completion order, not
//! request order.
//!
//! ## Example
//!
//! ```rust,ignore
//! use linkfetcher::engine::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! let results = engine.run_batch(vec!["https://example.com".into()]).await?;
//! engine.stop().await;
//! ```

pub mod fetch;
pub mod models;
pub mod pool;
pub mod tags;

pub use fetch::{FetchConfig, FetchError, Fetcher, HttpFetcher};
pub use models::{Element, FetchErrorKind, FetchResult, INTERNAL_ERROR_STATUS, Meta};
pub use pool::{Task, WorkerPool};
pub use tags::{TagCountError, TagCounts, count_tags};

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine is stopped")]
    Stopped,

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to start engine: {0}")]
    Startup(String),
}

/// Engine sizing and per-fetch limits
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub fetch: FetchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_capacity: 64,
            fetch: FetchConfig::default(),
        }
    }
}

pub struct Engine {
    pool: Arc<WorkerPool>,
    // Batches in flight; closed once `stop()` begins
    batches: TaskTracker,
}

impl Engine {
    /// Start an engine backed by the HTTP fetcher.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let fetcher =
            HttpFetcher::new(&config.fetch).map_err(|e| EngineError::Startup(e.to_string()))?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Start an engine around any [`Fetcher`].
    pub fn with_fetcher(
        config: EngineConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, EngineError> {
        if config.workers == 0 {
            return Err(EngineError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if config.queue_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }

        let pool = WorkerPool::start(config.workers, config.queue_capacity, fetcher);
        Ok(Self {
            pool: Arc::new(pool),
            batches: TaskTracker::new(),
        })
    }

    /// Fetch every URL and return all results once the last one lands.
    ///
    /// Duplicates are fetched independently. Individual failures are
    /// reported inside their [`FetchResult`]; the only error is calling
    /// this once [`Engine::stop`] has begun.
    pub async fn run_batch(&self, urls: Vec<String>) -> Result<Vec<FetchResult>, EngineError> {
        // Registered before the check, so `stop()` either waits for this
        // batch or this batch sees the tracker closed.
        let _in_flight = self.batches.token();
        if self.batches.is_closed() || !self.pool.is_running() {
            return Err(EngineError::Stopped);
        }
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let batch_id = Uuid::now_v7();
        let total = urls.len();
        let started = Instant::now();
        info!(%batch_id, urls = total, "Batch accepted");

        let mut waiters = JoinSet::new();
        for url in urls {
            let pool = self.pool.clone();
            waiters.spawn(async move {
                let (task, slot) = Task::new(url.clone());
                pool.submit(task).await;
                slot.await.unwrap_or_else(|_| {
                    FetchResult::failed(
                        url,
                        &FetchError::Internal("worker dropped the task".to_string()),
                    )
                })
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = waiters.join_next().await {
            match joined {
                Ok(result) => {
                    debug!(%batch_id, url = %result.url, status = result.meta.status, "Result collected");
                    results.push(result);
                }
                Err(e) => error!(%batch_id, error = %e, "Batch waiter panicked"),
            }
        }

        let failed = results.iter().filter(|r| r.is_error()).count();
        info!(
            %batch_id,
            total,
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch completed"
        );

        Ok(results)
    }

    /// Refuse new batches, let in-flight batches complete, then stop
    /// all workers.
    pub async fn stop(&self) {
        self.batches.close();
        if !self.batches.is_empty() {
            info!(batches = self.batches.len(), "Waiting for in-flight batches");
        }
        self.batches.wait().await;
        self.pool.stop().await;
    }

    pub fn is_running(&self) -> bool {
        !self.batches.is_closed() && self.pool.is_running()
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }
}
