//! Bounded concurrency for in-flight extraction operations.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps the number of in-flight remote operations.
///
/// Waiters are woken in FIFO order (`tokio::sync::Semaphore` queues
/// fairly). The slot is released when the returned guard drops, so
/// release is guaranteed on every exit path, including panics and early
/// returns.
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_slots: usize,
}

/// An acquired slot. Dropping it frees the slot and wakes the
/// longest-waiting acquirer, if any.
pub struct SlotGuard {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    pub fn new(max_slots: usize) -> Self {
        let max_slots = max_slots.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_slots)),
            max_slots,
        }
    }

    /// Suspend until a slot is free.
    pub async fn acquire(&self) -> SlotGuard {
        // The semaphore is never closed, so acquire cannot fail.
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore closed");
        SlotGuard { _permit: permit }
    }

    /// Number of slots currently held.
    pub fn in_flight(&self) -> usize {
        self.max_slots - self.semaphore.available_permits()
    }

    /// Configured maximum.
    pub fn max_slots(&self) -> usize {
        self.max_slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_in_flight_never_exceeds_max() {
        let limiter = Arc::new(ConcurrencyLimiter::new(2));
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);

            handles.push(tokio::spawn(async move {
                let _slot = limiter.acquire().await;
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                current.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_guard_drop_releases_slot() {
        let limiter = ConcurrencyLimiter::new(1);

        {
            let _slot = limiter.acquire().await;
            assert_eq!(limiter.in_flight(), 1);
        }

        assert_eq!(limiter.in_flight(), 0);
        let _again = limiter.acquire().await;
        assert_eq!(limiter.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_waiters_wake_in_fifo_order() {
        let limiter = Arc::new(ConcurrencyLimiter::new(1));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let held = limiter.acquire().await;

        let mut handles = Vec::new();
        for id in 0..3 {
            let limiter = Arc::clone(&limiter);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let _slot = limiter.acquire().await;
                order.lock().unwrap().push(id);
            }));
            // Ensure each waiter is queued before the next one arrives.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        drop(held);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }
}
