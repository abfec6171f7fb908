//! Bounded connection pool shared by all workers
//!
//! The pool is a fixed set of permits sized at client construction. Every
//! store call holds exactly one permit for its duration, so the number of
//! in-flight requests can never exceed the pool capacity regardless of how
//! many workers are running. Acquisition awaits when the pool is exhausted.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::error::{S3Error, S3Result};

/// Fixed-capacity pool of connection permits
#[derive(Clone)]
pub struct ConnectionPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

/// A held connection permit, released on drop
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConnectionPool {
    /// Create a pool with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Acquire a permit, waiting if all connections are in use
    pub async fn acquire(&self) -> S3Result<ConnectionPermit> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| S3Error::Sdk("connection pool closed".to_string()))?;

        Ok(ConnectionPermit { _permit: permit })
    }

    /// Total pool capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently available
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let pool = ConnectionPool::new(2);
        assert_eq!(pool.available(), 2);

        let p1 = pool.acquire().await.unwrap();
        let p2 = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);

        drop(p1);
        assert_eq!(pool.available(), 1);
        drop(p2);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_acquire_waits_when_exhausted() {
        let pool = ConnectionPool::new(1);
        let held = pool.acquire().await.unwrap();

        // With the only permit held, a second acquire must not complete
        let pending = pool.acquire();
        tokio::pin!(pending);
        let waited = tokio::time::timeout(std::time::Duration::from_millis(20), &mut pending)
            .await
            .is_err();
        assert!(waited);

        drop(held);
        assert!(pending.await.is_ok());
    }
}
