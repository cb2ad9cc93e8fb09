// db/cache.rs
use redis::{aio::ConnectionManager, AsyncCommands};
use std::sync::Arc;

pub struct CacheHelper;

impl CacheHelper {
    fn blacklist_key(token_id: &str) -> String {
        format!("token_blacklist:{}", token_id)
    }

    /// Revoke one token until it would have expired anyway.
    pub async fn blacklist_token(
        redis: &Arc<ConnectionManager>,
        token_id: &str,
        ttl_seconds: usize,
    ) -> Result<(), redis::RedisError> {
        let key = Self::blacklist_key(token_id);
        let mut conn = ConnectionManager::clone(redis);
        let _: () = conn.set_ex(&key, "1", ttl_seconds.max(1)).await?;
        tracing::debug!("Token blacklisted: {} (TTL: {}s)", key, ttl_seconds);
        Ok(())
    }

    pub async fn is_token_blacklisted(
        redis: &Arc<ConnectionManager>,
        token_id: &str,
    ) -> Result<bool, redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        redis::cmd("EXISTS")
            .arg(Self::blacklist_key(token_id))
            .query_async(&mut conn)
            .await
    }

    /// Round-trip check for the health endpoint.
    pub async fn ping(redis: &Arc<ConnectionManager>) -> Result<String, redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        redis::cmd("PING").query_async(&mut conn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklist_key_is_per_token() {
        assert_eq!(
            CacheHelper::blacklist_key("6f1c2a4e-0b7d-4a51-9d0e-2f7c1b3a9e55"),
            "token_blacklist:6f1c2a4e-0b7d-4a51-9d0e-2f7c1b3a9e55"
        );
        assert_ne!(CacheHelper::blacklist_key("a"), CacheHelper::blacklist_key("b"));
    }
}
