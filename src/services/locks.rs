use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-product async locks. Every read-modify-write of a product's stock
/// holds the product's guard for the whole database transaction.
#[derive(Clone, Default)]
pub struct ProductLocks {
    inner: Arc<DashMap<i32, Arc<Mutex<()>>>>,
}

impl ProductLocks {
    /// Waits for exclusive access to `product_id`.
    pub async fn acquire(&self, product_id: i32) -> OwnedMutexGuard<()> {
        let lock = self
            .inner
            .entry(product_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drops the lock entry for a product nobody is waiting on.
    pub fn release_idle(&self, product_id: i32) {
        self.inner
            .remove_if(&product_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn tracked(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_product_is_serialized() {
        let locks = ProductLocks::default();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(1).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_products_do_not_block_each_other() {
        let locks = ProductLocks::default();
        let _first = locks.acquire(1).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_released() {
        let locks = ProductLocks::default();
        let guard = locks.acquire(5).await;
        locks.release_idle(5);
        assert_eq!(locks.tracked(), 1);

        drop(guard);
        locks.release_idle(5);
        assert_eq!(locks.tracked(), 0);
    }
}
