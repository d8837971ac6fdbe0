use redis::AsyncCommands;
use redis::Client;

use crate::db::store::KeyValueStore;
use crate::error::AppResult;

const KEY_PREFIX: &str = "cinematch";

/// Creates a Redis client for the key-value store
///
/// The connection itself is opened lazily on the first command.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Key-value store backed by Redis
///
/// Used instead of the file store when several companion processes share one
/// cache and session. Values never expire on the Redis side; the recommendation
/// cache applies its own TTL.
#[derive(Clone)]
pub struct RedisStore {
    redis_client: Client,
}

impl RedisStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    fn namespaced(key: &str) -> String {
        format!("{}:{}", KEY_PREFIX, key)
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(Self::namespaced(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(Self::namespaced(key), value).await?;
        tracing::debug!(key = %key, bytes = value.len(), "Stored value in Redis");
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(Self::namespaced(key)).await?;
        Ok(())
    }
}

// TODO : Run the Redis-backed tests against a mock server like 'mock-redis-server' instead of localhost

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        assert_eq!(RedisStore::namespaced("refreshToken"), "cinematch:refreshToken");
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_set_get_remove_roundtrip() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let store = RedisStore::new(create_redis_client(&redis_url).unwrap());

        store.set("test_roundtrip", "value").await.unwrap();
        assert_eq!(
            store.get("test_roundtrip").await.unwrap(),
            Some("value".to_string())
        );

        store.remove("test_roundtrip").await.unwrap();
        assert_eq!(store.get("test_roundtrip").await.unwrap(), None);
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(create_redis_client("not-a-url").is_err());
    }
}
