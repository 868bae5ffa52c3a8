mod redis_store;
pub mod store;

pub use redis_store::RedisStore;
pub use store::{FileStore, InMemoryStore, KeyValueStore};

use crate::config::TokenStoreKind;
use crate::error::AppResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key holding the serialized token
pub const TOKEN_KEY: &str = "subtrack_calendar_token";

/// A cached authorization grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    /// Milliseconds since the Unix epoch
    pub expires_at: i64,
}

impl StoredToken {
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at
    }
}

/// Local cache for the calendar access token
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn KeyValueStore>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Build the cache on top of the configured store
    pub fn from_kind(kind: &TokenStoreKind) -> AppResult<Self> {
        let store: Arc<dyn KeyValueStore> = match kind {
            TokenStoreKind::File(path) => Arc::new(FileStore::new(path.clone())),
            TokenStoreKind::Redis(url) => Arc::new(RedisStore::new(url)?),
        };
        Ok(Self::new(store))
    }

    /// Persist `token`, valid for `ttl_seconds` from now
    pub async fn store(&self, token: &str, ttl_seconds: i64) -> AppResult<StoredToken> {
        self.store_at(token, ttl_seconds, Utc::now().timestamp_millis())
            .await
    }

    /// Return the cached token unless it has expired
    pub async fn read(&self) -> AppResult<Option<StoredToken>> {
        self.read_at(Utc::now().timestamp_millis()).await
    }

    pub async fn store_at(
        &self,
        token: &str,
        ttl_seconds: i64,
        now_ms: i64,
    ) -> AppResult<StoredToken> {
        let stored = StoredToken {
            access_token: token.to_string(),
            expires_at: now_ms.saturating_add(ttl_seconds.saturating_mul(1000)),
        };
        let json = serde_json::to_string(&stored)?;
        self.store.set(TOKEN_KEY, &json).await?;

        debug!("Cached access token until {}", stored.expires_at);
        Ok(stored)
    }

    /// Expired and unreadable entries are deleted and reported as absent
    pub async fn read_at(&self, now_ms: i64) -> AppResult<Option<StoredToken>> {
        let Some(raw) = self.store.get(TOKEN_KEY).await? else {
            return Ok(None);
        };

        let token = match serde_json::from_str::<StoredToken>(&raw) {
            Ok(token) => token,
            Err(e) => {
                warn!("Discarding unreadable cached token: {}", e);
                self.store.remove(TOKEN_KEY).await?;
                return Ok(None);
            }
        };

        if token.is_valid_at(now_ms) {
            Ok(Some(token))
        } else {
            debug!("Cached access token expired at {}", token.expires_at);
            self.store.remove(TOKEN_KEY).await?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> (Arc<InMemoryStore>, TokenCache) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), TokenCache::new(store))
    }

    #[tokio::test]
    async fn store_computes_expiry_in_millis() {
        let (_, cache) = cache();
        let stored = cache.store_at("abc", 3599, 1_000).await.unwrap();
        assert_eq!(stored.expires_at, 1_000 + 3_599_000);
    }

    #[tokio::test]
    async fn huge_ttl_saturates_expiry() {
        let (_, cache) = cache();
        let stored = cache.store_at("abc", i64::MAX / 10, 1_000).await.unwrap();

        assert_eq!(stored.expires_at, i64::MAX);
        assert_eq!(cache.read_at(1_000).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn read_before_expiry_returns_exact_token() {
        let (_, cache) = cache();
        let stored = cache.store_at("abc", 60, 0).await.unwrap();

        assert_eq!(cache.read_at(59_999).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn read_at_expiry_deletes_entry() {
        let (store, cache) = cache();
        cache.store_at("abc", 60, 0).await.unwrap();

        assert_eq!(cache.read_at(60_000).await.unwrap(), None);
        assert!(store.get(TOKEN_KEY).await.unwrap().is_none());
        // Later reads stay empty even if the clock goes backwards
        assert_eq!(cache.read_at(0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn store_overwrites_previous_token() {
        let (store, cache) = cache();
        cache.store_at("old", 60, 0).await.unwrap();
        cache.store_at("new", 120, 0).await.unwrap();

        assert_eq!(store.len().await, 1);
        let token = cache.read_at(100_000).await.unwrap().unwrap();
        assert_eq!(token.access_token, "new");
    }

    #[tokio::test]
    async fn unreadable_entry_is_dropped() {
        let (store, cache) = cache();
        store.set(TOKEN_KEY, "{\"access_token\":").await.unwrap();

        assert_eq!(cache.read_at(0).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn missing_entry_is_not_an_error() {
        let (_, cache) = cache();
        assert_eq!(cache.read().await.unwrap(), None);
    }
}
