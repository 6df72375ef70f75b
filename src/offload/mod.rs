//! Bounded worker pool for CPU-bound work
//!
//! Pixel work must never run on the async runtime's worker threads. Every
//! unit of work goes through [`WorkerPool::run`], which:
//!
//! - waits (asynchronously) for one of `capacity` permits, so no more than
//!   `capacity` rasters are decoded at once,
//! - runs the work on tokio's blocking pool via `spawn_blocking`,
//! - hands the result or failure back to the awaiting caller.
//!
//! The permit travels with the work and is released only when the work
//! finishes, so a caller that stops waiting (timeout) does not free a slot
//! that is still busy.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

use crate::error::ResizeError;

pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
    timeout: Option<Duration>,
}

impl WorkerPool {
    /// Pool allowing `capacity` concurrent jobs (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            timeout: None,
        }
    }

    /// Give up waiting for a job after `timeout`
    ///
    /// Waiting for a permit does not count towards the timeout, only the
    /// job's own execution does.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held by a running job
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `work` on a blocking worker and await its result
    pub async fn run<F, T>(&self, work: F) -> Result<T, ResizeError>
    where
        F: FnOnce() -> Result<T, ResizeError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ResizeError::WorkerFailed {
                message: "worker pool is closed".to_string(),
            })?;

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        });

        let joined = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        "Worker did not finish before timeout"
                    );
                    return Err(ResizeError::ProcessingTimeout {
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
            },
            None => handle.await,
        };

        joined.map_err(join_error)?
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn join_error(err: JoinError) -> ResizeError {
    let message = if err.is_panic() {
        format!("worker panicked: {}", panic_message(err.into_panic()))
    } else {
        "worker was cancelled".to_string()
    };
    ResizeError::WorkerFailed { message }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
