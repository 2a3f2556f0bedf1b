//! In-memory replay store.
//!
//! A HashMap-based store for testing, development, and single-instance
//! deployments where replay state does not need to survive restarts.

use super::{ReplayEntry, ReplayStore, StoreStats};
use crate::canary::error::SignError;
use crate::canary::time_utils::current_timestamp;
use async_trait::async_trait;
use std::time::Duration;

/// A simple in-memory replay store.
///
/// Uses a `HashMap` behind tokio's `RwLock`. The duplicate check and the
/// insert happen under a single write lock, which gives the atomic
/// insert-if-absent the [`ReplayStore`] contract requires. Expired entries
/// are only removed during cleanup sweeps.
///
/// Replay state is lost on restart, so this backend is only suitable for
/// single-instance deployments with freshness windows short enough that a
/// restart gap is acceptable.
///
/// # Example
///
/// ```rust
/// use kanariya_sign::storage::{MemoryStore, ReplayStore};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), kanariya_sign::SignError> {
/// let store = MemoryStore::new();
/// store.insert("tok", "nonce-1", Duration::from_secs(300)).await?;
/// assert!(store.exists("tok", "nonce-1").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: std::sync::Arc<tokio::sync::RwLock<std::collections::HashMap<String, ReplayEntry>>>,
}

impl MemoryStore {
    /// Creates a new in-memory replay store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map key for a `(token, nonce)` pair.
    ///
    /// Tokens and nonces are base64url, so `:` cannot occur in either and
    /// the key is unambiguous.
    fn make_key(token: &str, nonce: &str) -> String {
        let mut key = String::with_capacity(token.len() + nonce.len() + 1);
        key.push_str(token);
        key.push(':');
        key.push_str(nonce);
        key
    }
}

#[async_trait]
impl ReplayStore for MemoryStore {
    async fn get(&self, token: &str, nonce: &str) -> Result<Option<ReplayEntry>, SignError> {
        let key = Self::make_key(token, nonce);
        let data = self.data.read().await;
        Ok(data.get(&key).cloned())
    }

    async fn insert(&self, token: &str, nonce: &str, _ttl: Duration) -> Result<(), SignError> {
        let key = Self::make_key(token, nonce);
        let entry = ReplayEntry {
            token: token.to_string(),
            nonce: nonce.to_string(),
            recorded_at: current_timestamp()?,
        };

        let mut data = self.data.write().await;
        if data.contains_key(&key) {
            return Err(SignError::Replayed);
        }
        data.insert(key, entry);
        Ok(())
    }

    async fn exists(&self, token: &str, nonce: &str) -> Result<bool, SignError> {
        let key = Self::make_key(token, nonce);
        let data = self.data.read().await;
        Ok(data.contains_key(&key))
    }

    async fn cleanup_expired(&self, cutoff_time: u64) -> Result<usize, SignError> {
        let mut data = self.data.write().await;
        let before = data.len();
        data.retain(|_, entry| entry.recorded_at > cutoff_time);
        Ok(before - data.len())
    }

    async fn stats(&self) -> Result<StoreStats, SignError> {
        let data = self.data.read().await;
        let memory_usage = data.len() * std::mem::size_of::<ReplayEntry>();
        Ok(StoreStats {
            total_records: data.len(),
            backend_info: format!("in-memory HashMap store (~{memory_usage} bytes)"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_operations() -> Result<(), SignError> {
        let store = MemoryStore::new();

        store
            .insert("tok", "nonce-1", Duration::from_secs(300))
            .await?;
        assert!(store.exists("tok", "nonce-1").await?);

        let entry = store.get("tok", "nonce-1").await?.unwrap();
        assert_eq!(entry.token, "tok");
        assert_eq!(entry.nonce, "nonce-1");
        assert!(entry.recorded_at > 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_pair_rejected() -> Result<(), SignError> {
        let store = MemoryStore::new();

        store
            .insert("tok", "nonce-1", Duration::from_secs(300))
            .await?;
        let result = store.insert("tok", "nonce-1", Duration::from_secs(300)).await;
        assert!(matches!(result, Err(SignError::Replayed)));

        Ok(())
    }

    #[tokio::test]
    async fn test_token_scoping() -> Result<(), SignError> {
        let store = MemoryStore::new();

        // Same nonce under different tokens is two different pairs
        store
            .insert("tok-a", "nonce-1", Duration::from_secs(300))
            .await?;
        store
            .insert("tok-b", "nonce-1", Duration::from_secs(300))
            .await?;

        assert!(store.exists("tok-a", "nonce-1").await?);
        assert!(store.exists("tok-b", "nonce-1").await?);
        assert!(!store.exists("tok-c", "nonce-1").await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_cleanup() -> Result<(), SignError> {
        let store = MemoryStore::new();

        store
            .insert("tok", "nonce-1", Duration::from_secs(300))
            .await?;
        store
            .insert("tok", "nonce-2", Duration::from_secs(300))
            .await?;

        // Cutoff in the future removes everything
        let future = current_timestamp()? + 3600;
        let removed = store.cleanup_expired(future).await?;
        assert_eq!(removed, 2);
        assert!(!store.exists("tok", "nonce-1").await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_stats() -> Result<(), SignError> {
        let store = MemoryStore::new();

        let stats = store.stats().await?;
        assert_eq!(stats.total_records, 0);

        store
            .insert("tok", "nonce-1", Duration::from_secs(300))
            .await?;
        let stats = store.stats().await?;
        assert_eq!(stats.total_records, 1);
        assert!(stats.backend_info.contains("in-memory"));

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_inserts_one_winner() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut handles = vec![];

        // All tasks race on the same (token, nonce) pair
        for _ in 0..10 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert("tok", "contested", Duration::from_secs(300)).await
            }));
        }

        let mut winners = 0;
        let mut replays = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => winners += 1,
                Err(SignError::Replayed) => replays += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(replays, 9);
    }
}
