//! Pluggable replay stores for consumed `(token, nonce)` pairs.
//!
//! The replay store is the only shared mutable state in the verification
//! path. It is modeled as an injected capability so single-instance
//! deployments can use an in-memory map while multi-instance deployments
//! back it with a shared cache.

use crate::canary::error::SignError;
use async_trait::async_trait;
use std::time::Duration;

// Always available
mod memory;
pub use memory::MemoryStore;

#[cfg(feature = "redis-storage")]
mod redis;
#[cfg(feature = "redis-storage")]
pub use redis::RedisStore;

/// A recorded replay entry with its metadata.
#[derive(Debug, Clone)]
pub struct ReplayEntry {
    /// The token whose URL was consumed
    pub token: String,
    /// The single-use nonce
    pub nonce: String,
    /// Unix timestamp when the pair was recorded
    pub recorded_at: u64,
}

/// Statistics about a replay store backend.
#[derive(Debug, Clone)]
pub struct StoreStats {
    /// Total number of recorded pairs
    pub total_records: usize,
    /// Backend-specific description
    pub backend_info: String,
}

/// Abstract replay store for consumed `(token, nonce)` pairs.
///
/// Implementations must provide atomic insert-if-absent: when two concurrent
/// verifications race on the same pair, exactly one `insert` succeeds and
/// the other returns [`SignError::Replayed`].
///
/// # Available Implementations
///
/// - [`MemoryStore`] - always available, in-memory map for single-instance
///   deployments
/// - `RedisStore` - `redis-storage` feature, shared cache with atomic
///   `SET NX EX` for multi-instance deployments
///
/// # Example Implementation
///
/// ```rust
/// use kanariya_sign::storage::{ReplayStore, ReplayEntry, StoreStats};
/// use kanariya_sign::SignError;
/// use async_trait::async_trait;
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio::sync::RwLock;
///
/// #[derive(Default)]
/// pub struct CustomStore {
///     data: Arc<RwLock<HashMap<String, ReplayEntry>>>,
/// }
///
/// #[async_trait]
/// impl ReplayStore for CustomStore {
///     async fn get(&self, token: &str, nonce: &str) -> Result<Option<ReplayEntry>, SignError> {
///         let key = format!("{token}:{nonce}");
///         Ok(self.data.read().await.get(&key).cloned())
///     }
///
///     async fn insert(&self, token: &str, nonce: &str, _ttl: Duration) -> Result<(), SignError> {
///         let key = format!("{token}:{nonce}");
///         let entry = ReplayEntry {
///             token: token.to_string(),
///             nonce: nonce.to_string(),
///             recorded_at: 0,
///         };
///         let mut data = self.data.write().await;
///         if data.contains_key(&key) {
///             return Err(SignError::Replayed);
///         }
///         data.insert(key, entry);
///         Ok(())
///     }
///
///     async fn exists(&self, token: &str, nonce: &str) -> Result<bool, SignError> {
///         let key = format!("{token}:{nonce}");
///         Ok(self.data.read().await.contains_key(&key))
///     }
///
///     async fn cleanup_expired(&self, cutoff_time: u64) -> Result<usize, SignError> {
///         let mut data = self.data.write().await;
///         let before = data.len();
///         data.retain(|_, entry| entry.recorded_at > cutoff_time);
///         Ok(before - data.len())
///     }
///
///     async fn stats(&self) -> Result<StoreStats, SignError> {
///         Ok(StoreStats {
///             total_records: self.data.read().await.len(),
///             backend_info: "custom".to_string(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait ReplayStore: Send + Sync {
    /// Optional backend initialization (schema setup, connectivity check).
    async fn init(&self) -> Result<(), SignError> {
        Ok(())
    }

    /// Retrieves a recorded pair if present.
    async fn get(&self, token: &str, nonce: &str) -> Result<Option<ReplayEntry>, SignError>;

    /// Atomically records a `(token, nonce)` pair with a TTL.
    ///
    /// Returns [`SignError::Replayed`] if the pair is already recorded. The
    /// duplicate check and the insert must be one atomic step.
    async fn insert(&self, token: &str, nonce: &str, ttl: Duration) -> Result<(), SignError>;

    /// Checks whether a pair is recorded, without retrieving it.
    async fn exists(&self, token: &str, nonce: &str) -> Result<bool, SignError>;

    /// Removes pairs recorded at or before `cutoff_time` (Unix seconds).
    ///
    /// Returns the number of removed records. Backends with native TTL
    /// expiry may treat this as a best-effort sweep.
    async fn cleanup_expired(&self, cutoff_time: u64) -> Result<usize, SignError>;

    /// Returns statistics about the backend, for monitoring and debugging.
    async fn stats(&self) -> Result<StoreStats, SignError>;
}
