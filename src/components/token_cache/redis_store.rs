use super::store::KeyValueStore;
use crate::error::{storage_error, AppResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};
use tracing::info;

/// Key/value store backed by a Redis server
pub struct RedisStore {
    client: RedisClient,
}

impl RedisStore {
    /// Create a new Redis store; no connection is made until first use
    pub fn new(redis_url: &str) -> AppResult<Self> {
        info!("Using Redis token store at {}", redis_url);

        let client = RedisClient::open(redis_url)
            .map_err(|e| storage_error(&format!("Failed to create Redis client: {}", e)))?;

        Ok(Self { client })
    }

    async fn get_connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| storage_error(&format!("Failed to connect to Redis: {}", e)))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| storage_error(&format!("Redis GET error: {}", e)))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        () = conn
            .set(key, value)
            .await
            .map_err(|e| storage_error(&format!("Redis SET error: {}", e)))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        () = conn
            .del(key)
            .await
            .map_err(|e| storage_error(&format!("Redis DEL error: {}", e)))?;
        Ok(())
    }
}
