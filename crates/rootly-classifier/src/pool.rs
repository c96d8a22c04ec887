//! Concurrency pool for classifier processes.
//!
//! Every upload needs one classifier process. The pool caps how many run at
//! once; excess requests queue on the semaphore for at most `queue_timeout`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

use crate::error::{ClassifierError, ClassifierResult};

/// Semaphore-backed limit on concurrent classifier processes.
#[derive(Clone)]
pub struct ClassifierPool {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    queue_timeout: Option<Duration>,
}

impl ClassifierPool {
    /// Create a pool allowing `max_concurrent` processes (at least one).
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            queue_timeout: None,
        }
    }

    /// Bound how long a request may wait for a free slot.
    pub fn with_queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = Some(timeout);
        self
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> ClassifierResult<ClassifierPermit> {
        let acquire = Arc::clone(&self.semaphore).acquire_owned();

        let permit = match self.queue_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, acquire).await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(
                        max_concurrent = self.max_concurrent,
                        "No classifier slot freed within {:?}", timeout
                    );
                    return Err(ClassifierError::Busy);
                }
            },
            None => acquire.await,
        }
        .map_err(|_| ClassifierError::Busy)?;

        Ok(ClassifierPermit { _permit: permit })
    }

    /// Get pool statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            in_use: self.max_concurrent - self.semaphore.available_permits(),
            max_concurrent: self.max_concurrent,
        }
    }
}

impl Default for ClassifierPool {
    fn default() -> Self {
        Self::new(
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        )
    }
}

/// Slot held for the lifetime of one classifier process.
#[derive(Debug)]
pub struct ClassifierPermit {
    _permit: OwnedSemaphorePermit,
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    pub in_use: usize,
    pub max_concurrent: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permits_are_released_on_drop() {
        let pool = ClassifierPool::new(2);
        let a = pool.acquire().await.unwrap();
        let _b = pool.acquire().await.unwrap();
        assert_eq!(pool.stats().in_use, 2);

        drop(a);
        assert_eq!(pool.stats().in_use, 1);
    }

    #[tokio::test]
    async fn test_busy_after_queue_timeout() {
        let pool = ClassifierPool::new(1).with_queue_timeout(Duration::from_millis(50));
        let _held = pool.acquire().await.unwrap();

        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, ClassifierError::Busy));
    }

    #[tokio::test]
    async fn test_waiter_gets_slot_when_freed() {
        let pool = ClassifierPool::new(1).with_queue_timeout(Duration::from_secs(5));
        let held = pool.acquire().await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);

        assert!(waiter.await.unwrap().is_ok());
    }

    #[test]
    fn test_zero_is_clamped() {
        assert_eq!(ClassifierPool::new(0).stats().max_concurrent, 1);
    }
}
