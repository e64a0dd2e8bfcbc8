//! Per-collection write serialization for read-modify-write mutations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per collection, created on first use. Reads never take it.
#[derive(Default)]
pub struct WriteLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl WriteLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access to `collection`. Released on drop.
    pub async fn acquire(&self, collection: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(collection.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_collection_is_exclusive() {
        let locks = Arc::new(WriteLocks::new());
        let guard = locks.acquire("products").await;
        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = other.acquire("products").await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn collections_are_independent() {
        let locks = WriteLocks::new();
        let _a = locks.acquire("products").await;
        let _b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("posts"))
            .await
            .expect("posts lock should be free");
    }
}
