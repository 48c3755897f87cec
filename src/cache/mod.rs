//! Response cache for completed recommendation results
//!
//! Entries are keyed by a digest of (user, normalized term, tier) and carry
//! their own expiry, so any key-value [`CacheStore`] can back the cache.
//! Store failures are logged and treated as misses.

use crate::error::{Error, Result};
use crate::query::normalize_term;
use crate::results::TierResult;
use crate::tiers::Tier;
use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Key-value backend for the response cache
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn put(&self, key: String, value: Vec<u8>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// In-process store backed by moka
pub struct MemoryStore {
    cache: Cache<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();
        Self { cache }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.cache.get(key).await)
    }

    async fn put(&self, key: String, value: Vec<u8>) -> Result<()> {
        self.cache.insert(key, value).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        Ok(())
    }
}

/// Stored form of a cached result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    /// Unix time in milliseconds after which the entry is stale
    expires_at: i64,
    payload: TierResult,
}

/// Stable key for a (user, term, tier) triple
pub fn cache_key(user_id: &str, search_term: &str, tier: Tier) -> String {
    use sha2::{Digest, Sha256};

    let material = serde_json::json!([user_id, normalize_term(search_term), tier.as_str()]);
    let mut hasher = Sha256::new();
    hasher.update(material.to_string().as_bytes());

    format!("{:x}", hasher.finalize())
}

/// TTL cache of completed tier results
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    enabled: bool,
}

impl ResponseCache {
    /// Create a new cache with the given entry TTL
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            enabled: true,
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self {
            store: Arc::new(MemoryStore::new(0)),
            ttl: Duration::ZERO,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Look up a cached result
    ///
    /// Expired or undecodable entries are removed and reported as absent.
    pub async fn get(&self, user_id: &str, search_term: &str, tier: Tier) -> Option<TierResult> {
        if !self.enabled {
            return None;
        }

        let key = cache_key(user_id, search_term, tier);
        let bytes = match self.store.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed: {}", e);
                return None;
            }
        };

        let entry = match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Dropping undecodable cache entry {}: {}", key, e);
                self.remove(&key).await;
                return None;
            }
        };

        if Utc::now().timestamp_millis() >= entry.expires_at {
            debug!("Cache entry {} expired", key);
            self.remove(&key).await;
            return None;
        }

        Some(entry.payload)
    }

    /// Store a result; returns whether it was stored
    ///
    /// Timed out or failed results are never stored.
    pub async fn set(
        &self,
        user_id: &str,
        search_term: &str,
        tier: Tier,
        result: &TierResult,
    ) -> bool {
        if !self.enabled || !result.is_cacheable() {
            return false;
        }

        let bytes = match self.encode(result) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode cache entry: {}", e);
                return false;
            }
        };

        let key = cache_key(user_id, search_term, tier);
        match self.store.put(key, bytes).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache write failed: {}", e);
                false
            }
        }
    }

    /// Remove one entry
    pub async fn invalidate(&self, user_id: &str, search_term: &str, tier: Tier) -> bool {
        let key = cache_key(user_id, search_term, tier);
        self.remove(&key).await
    }

    /// Remove every entry
    pub async fn clear(&self) -> bool {
        match self.store.clear().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache clear failed: {}", e);
                false
            }
        }
    }

    fn encode(&self, result: &TierResult) -> Result<Vec<u8>> {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let entry = CacheEntry {
            expires_at: Utc::now().timestamp_millis().saturating_add(ttl_ms),
            payload: result.clone(),
        };
        serde_json::to_vec(&entry).map_err(Error::from)
    }

    async fn remove(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache delete failed: {}", e);
                false
            }
        }
    }
}
