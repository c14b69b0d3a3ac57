use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use threadpool::{Builder, ThreadPool};

use crate::config::EngineConfig;

/// Locks a mutex, recovering the data if a previous holder panicked.
///
/// No engine invariant spans a panic: compute functions run outside of any
/// node lock and their panics are caught.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A Send + Sync thread pool.
#[derive(Debug, Clone)]
pub struct SyncThreadPool {
    pool: Arc<Mutex<ThreadPool>>,
}

// From https://github.com/rust-threadpool/rust-threadpool/issues/96
impl SyncThreadPool {
    /// Create a new thread pool as described by `config`.
    pub fn new(config: &EngineConfig) -> Self {
        let pool = Builder::new()
            .num_threads(config.workers)
            .thread_name(config.thread_name.clone())
            .build();
        Self {
            pool: Arc::new(Mutex::new(pool)),
        }
    }

    /// Execute a job on the thread pool.
    pub fn execute(&self, job: impl FnOnce() + Send + 'static) {
        lock(&self.pool).execute(job)
    }

    /// Blocks until no job is queued or running, including jobs submitted by
    /// other jobs while waiting.
    pub fn join(&self) {
        // Join on a clone so running jobs can still submit through `execute`.
        let pool = lock(&self.pool).clone();
        pool.join();
    }
}
