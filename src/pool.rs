//! Bounded worker pool for generation calls.
//!
//! A [`WorkerPool`] is created at service start, shared as
//! `Arc<WorkerPool>`, and drained at shutdown. At most `workers` jobs run at
//! once; further jobs wait for a free slot.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::{DebateError, Result};

/// Worker count used by [`WorkerPool::default`].
pub const DEFAULT_WORKERS: usize = 4;

/// Fixed-size pool running jobs on spawned tasks.
///
/// # Example
///
/// ```
/// use decision_debate::WorkerPool;
///
/// # tokio_test::block_on(async {
/// let pool = WorkerPool::new(2);
/// let n = pool.run(async { Ok(21 * 2) }).await.unwrap();
/// assert_eq!(n, 42);
/// pool.drain().await;
/// assert!(pool.run(async { Ok(()) }).await.is_err());
/// # });
/// ```
#[derive(Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    workers: usize,
    closed: AtomicBool,
}

impl WorkerPool {
    /// Pool with `workers` slots (at least one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            closed: AtomicBool::new(false),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Slots not currently held by a job.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Run `job` on a spawned task once a slot is free, and wait for it.
    ///
    /// Fails with [`DebateError::PoolClosed`] once the pool is closed. A
    /// panicking job surfaces as [`DebateError::Other`].
    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(DebateError::PoolClosed);
        }
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DebateError::PoolClosed)?;
        debug!(available = self.available(), "worker slot acquired");

        let handle = tokio::spawn(async move {
            let result = job.await;
            drop(permit);
            result
        });
        handle
            .await
            .map_err(|e| DebateError::Other(format!("worker task failed: {e}")))?
    }

    /// Refuse new jobs. Jobs already running finish normally.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Close the pool and wait until every running job has released its slot.
    pub async fn drain(&self) {
        self.close();
        let workers = u32::try_from(self.workers).unwrap_or(u32::MAX);
        if let Ok(all) = self.permits.acquire_many(workers).await {
            drop(all);
        }
        self.permits.close();
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}
