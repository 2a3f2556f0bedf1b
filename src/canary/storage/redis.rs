//! Redis replay store.
//!
//! Backs the replay cache with a shared Redis instance so multiple verifier
//! instances agree on which `(token, nonce)` pairs are consumed.

use super::{ReplayEntry, ReplayStore, StoreStats};
use crate::canary::error::SignError;
use crate::canary::time_utils::current_timestamp;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Redis-backed replay store for multi-instance deployments.
///
/// Uses `SET NX EX` so the insert-if-absent is atomic across instances:
/// when two verifiers race on the same `(token, nonce)` pair, Redis lets
/// exactly one `SET` through. Expiry is delegated to Redis TTLs, with a
/// `SCAN`-based sweep available for explicit cleanup.
///
/// # Example
///
/// ```rust
/// use kanariya_sign::storage::RedisStore;
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), kanariya_sign::SignError> {
/// let store = Arc::new(RedisStore::new("redis://localhost:6379", "kanariya")?);
/// # Ok(())
/// # }
/// ```
pub struct RedisStore {
    client: Client,
    key_prefix: String,
    /// Shared persistent connection, lazily established and reused
    conn: Arc<Mutex<Option<MultiplexedConnection>>>,
}

impl RedisStore {
    /// Creates a new Redis replay store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `key_prefix` - prefix for all replay keys, to avoid collisions with
    ///   other users of the same Redis database
    pub fn new(redis_url: &str, key_prefix: &str) -> Result<Self, SignError> {
        let client = Client::open(redis_url)
            .map_err(|e| SignError::from_storage_message(format!("redis client error: {e}")))?;

        Ok(Self {
            client,
            key_prefix: key_prefix.to_string(),
            conn: Arc::new(Mutex::new(None)),
        })
    }

    /// Gets or creates the shared connection.
    async fn get_connection(&self) -> Result<MultiplexedConnection, SignError> {
        let mut conn_guard = self.conn.lock().await;

        if let Some(conn) = conn_guard.as_ref() {
            let mut test_conn = conn.clone();
            match redis::cmd("PING")
                .query_async::<_, String>(&mut test_conn)
                .await
            {
                Ok(_) => return Ok(conn.clone()),
                Err(_) => {
                    // Connection is dead, drop it and reconnect
                    *conn_guard = None;
                }
            }
        }

        let new_conn = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| {
                SignError::from_storage_message(format!("redis connection failed: {e}"))
            })?;

        *conn_guard = Some(new_conn.clone());
        Ok(new_conn)
    }

    /// Redis key for a `(token, nonce)` pair: `prefix:token:nonce`.
    ///
    /// Tokens and nonces are base64url, so the `:` separators stay
    /// unambiguous.
    fn make_key(&self, token: &str, nonce: &str) -> String {
        let mut key =
            String::with_capacity(self.key_prefix.len() + token.len() + nonce.len() + 2);
        key.push_str(&self.key_prefix);
        key.push(':');
        key.push_str(token);
        key.push(':');
        key.push_str(nonce);
        key
    }

    /// Parses a stored entry out of its key and value.
    fn parse_entry(&self, key: &str, value: &str) -> Result<ReplayEntry, SignError> {
        let recorded_at: u64 = value
            .parse()
            .map_err(|_| SignError::from_storage_message("invalid timestamp in redis value"))?;

        let mut parts = key.splitn(3, ':');
        let (_prefix, token, nonce) = match (parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(t), Some(n)) => (p, t, n),
            _ => return Err(SignError::from_storage_message("invalid redis key format")),
        };

        Ok(ReplayEntry {
            token: token.to_string(),
            nonce: nonce.to_string(),
            recorded_at,
        })
    }

    /// Scans keys matching a pattern. SCAN instead of KEYS, so a large
    /// replay set does not block the Redis server.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, SignError> {
        let mut conn = self.get_connection().await?;
        let mut keys = Vec::new();
        let mut cursor = 0u64;

        loop {
            let (new_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| SignError::from_storage_message(e.to_string()))?;

            keys.extend(batch);
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl ReplayStore for RedisStore {
    async fn init(&self) -> Result<(), SignError> {
        let mut conn = self.get_connection().await?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| SignError::from_storage_message(format!("redis ping failed: {e}")))?;

        Ok(())
    }

    async fn get(&self, token: &str, nonce: &str) -> Result<Option<ReplayEntry>, SignError> {
        let mut conn = self.get_connection().await?;
        let key = self.make_key(token, nonce);

        let value: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| SignError::from_storage_message(e.to_string()))?;

        match value {
            Some(val) => Ok(Some(self.parse_entry(&key, &val)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, token: &str, nonce: &str, ttl: Duration) -> Result<(), SignError> {
        let mut conn = self.get_connection().await?;
        let key = self.make_key(token, nonce);
        let value = current_timestamp()?.to_string();

        // Redis TTL is in whole seconds, minimum 1
        let ttl_secs = ttl.as_secs().max(1) as usize;

        // SET with NX and EX: atomic insert-if-absent with expiry
        let result: Result<Option<String>, _> = conn
            .set_options(
                &key,
                &value,
                redis::SetOptions::default()
                    .conditional_set(redis::ExistenceCheck::NX)
                    .with_expiration(redis::SetExpiry::EX(ttl_secs)),
            )
            .await;

        match result {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(SignError::Replayed), // Key already exists
            Err(e) => Err(SignError::from_storage_message(e.to_string())),
        }
    }

    async fn exists(&self, token: &str, nonce: &str) -> Result<bool, SignError> {
        let mut conn = self.get_connection().await?;
        let key = self.make_key(token, nonce);

        let exists: bool = conn
            .exists(&key)
            .await
            .map_err(|e| SignError::from_storage_message(e.to_string()))?;

        Ok(exists)
    }

    async fn cleanup_expired(&self, cutoff_time: u64) -> Result<usize, SignError> {
        let mut conn = self.get_connection().await?;

        let pattern = format!("{}:*", self.key_prefix);
        let keys = self.scan_keys(&pattern).await?;

        let mut to_delete = Vec::new();
        for chunk in keys.chunks(100) {
            let values: Vec<Option<String>> = redis::cmd("MGET")
                .arg(chunk)
                .query_async(&mut conn)
                .await
                .map_err(|e| SignError::from_storage_message(e.to_string()))?;

            for (key, value) in chunk.iter().zip(values.iter()) {
                if let Some(val) = value
                    && let Ok(entry) = self.parse_entry(key, val)
                    && entry.recorded_at <= cutoff_time
                {
                    to_delete.push(key.clone());
                }
            }
        }

        let mut deleted_count = 0;
        for chunk in to_delete.chunks(100) {
            if !chunk.is_empty() {
                let deleted: usize = conn
                    .del(chunk)
                    .await
                    .map_err(|e| SignError::from_storage_message(e.to_string()))?;
                deleted_count += deleted;
            }
        }

        Ok(deleted_count)
    }

    async fn stats(&self) -> Result<StoreStats, SignError> {
        let pattern = format!("{}:*", self.key_prefix);
        let keys = self.scan_keys(&pattern).await?;

        Ok(StoreStats {
            total_records: keys.len(),
            backend_info: format!("redis store (prefix: {})", self.key_prefix),
        })
    }
}
