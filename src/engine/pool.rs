//! Fixed-size worker pool
//!
//! Workers share one bounded task queue and one shutdown channel. Each
//! wake-up handles exactly one of the two: a task (run it, answer through
//! the task's own slot) or a shutdown signal (exit). `stop()` sends one
//! signal per worker instead of closing the queue, so submitters that are
//! still blocked on a full queue are never disturbed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::fetch::Fetcher;
use super::models::FetchResult;

/// One URL waiting for a worker
#[derive(Debug)]
pub struct Task {
    pub url: String,
    respond_to: oneshot::Sender<FetchResult>,
}

impl Task {
    /// Create a task and the receiving half of its result slot.
    pub fn new(url: impl Into<String>) -> (Self, oneshot::Receiver<FetchResult>) {
        let (respond_to, slot) = oneshot::channel();
        (
            Self {
                url: url.into(),
                respond_to,
            },
            slot,
        )
    }
}

type Shared<T> = Arc<Mutex<mpsc::Receiver<T>>>;

pub struct WorkerPool {
    queue: mpsc::Sender<Task>,
    shutdown: mpsc::Sender<()>,
    // Kept so the queue stays open after every worker has exited.
    _queue_rx: Shared<Task>,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    running: AtomicBool,
}

impl WorkerPool {
    /// Launch `num_workers` workers over a queue holding `queue_capacity` tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(num_workers: usize, queue_capacity: usize, fetcher: Arc<dyn Fetcher>) -> Self {
        info!(num_workers, queue_capacity, "Starting worker pool");

        let (queue, queue_rx) = mpsc::channel::<Task>(queue_capacity.max(1));
        let (shutdown, shutdown_rx) = mpsc::channel::<()>(num_workers.max(1));
        let queue_rx: Shared<Task> = Arc::new(Mutex::new(queue_rx));
        let shutdown_rx: Shared<()> = Arc::new(Mutex::new(shutdown_rx));

        let workers = (0..num_workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    queue_rx.clone(),
                    shutdown_rx.clone(),
                    fetcher.clone(),
                ))
            })
            .collect();

        Self {
            queue,
            shutdown,
            _queue_rx: queue_rx,
            workers: std::sync::Mutex::new(workers),
            worker_count: num_workers,
            running: AtomicBool::new(true),
        }
    }

    /// Hand a task to the queue, waiting while it is full.
    pub async fn submit(&self, task: Task) {
        if let Err(mpsc::error::SendError(task)) = self.queue.send(task).await {
            // `_queue_rx` lives as long as the pool
            debug_assert!(false, "task queue closed while the pool is alive");
            warn!(url = %task.url, "Task queue closed, task dropped");
        }
    }

    /// Signal every worker to exit after its current task, then wait for them.
    ///
    /// Queued tasks that no worker has claimed stay queued. Calling this
    /// twice is a no-op.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!(workers = self.worker_count, "Stopping worker pool");
        for _ in 0..self.worker_count {
            // Capacity equals worker count, so this never waits.
            if self.shutdown.send(()).await.is_err() {
                break;
            }
        }

        let handles = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker terminated abnormally");
            }
        }
        info!("Worker pool stopped");
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

enum Wakeup {
    Task(Task),
    Shutdown,
}

async fn worker_loop(
    worker_id: usize,
    queue: Shared<Task>,
    shutdown: Shared<()>,
    fetcher: Arc<dyn Fetcher>,
) {
    debug!(worker_id, "Worker started");

    loop {
        // Both receives are cancel-safe: the losing branch loses nothing.
        // Shutdown is polled first so a pending signal beats a queued task.
        let next_task = async {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let next_signal = async {
            let mut rx = shutdown.lock().await;
            rx.recv().await
        };

        let wakeup = tokio::select! {
            biased;
            _ = next_signal => Wakeup::Shutdown,
            task = next_task => match task {
                Some(task) => Wakeup::Task(task),
                None => Wakeup::Shutdown,
            },
        };

        match wakeup {
            Wakeup::Task(task) => {
                debug!(worker_id, url = %task.url, "Worker claimed task");
                let result = fetcher.fetch(&task.url).await;
                if task.respond_to.send(result).is_err() {
                    debug!(worker_id, url = %task.url, "Result slot dropped before delivery");
                }
            }
            Wakeup::Shutdown => break,
        }
    }

    debug!(worker_id, "Worker exited");
}
