use deadpool_redis::Pool;
use deadpool_redis::redis::RedisError;

use crate::domain::repository::{NonceStore, RateLimitStore};
use crate::error::CrmError;

#[derive(Clone)]
pub struct RedisNonceStore {
    pub pool: Pool,
}

impl NonceStore for RedisNonceStore {
    async fn remember(&self, key: &str, ttl_secs: u64) -> Result<bool, CrmError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| CrmError::Internal(e.into()))?;
        // SET NX replies OK when stored and nil when the key already exists.
        let stored: Option<String> = deadpool_redis::redis::cmd("SET")
            .arg(key)
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e: RedisError| CrmError::Internal(e.into()))?;
        Ok(stored.is_some())
    }
}

#[derive(Clone)]
pub struct RedisRateLimitStore {
    pub pool: Pool,
}

impl RateLimitStore for RedisRateLimitStore {
    async fn hit(&self, key: &str, window_secs: u64) -> Result<u64, CrmError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| CrmError::Internal(e.into()))?;
        let (count,): (u64,) = deadpool_redis::redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_secs as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e: RedisError| CrmError::Internal(e.into()))?;
        Ok(count)
    }
}
