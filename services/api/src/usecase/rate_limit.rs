use chrono::{DateTime, Utc};

use crate::domain::repository::RateLimitStore;
use crate::domain::types::RATE_LIMIT_WINDOW_SECS;
use crate::error::CrmError;

/// Counter family a route is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitBucket {
    Default,
    /// Login and public ingestion.
    Sensitive,
}

impl RateLimitBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Sensitive => "sensitive",
        }
    }
}

/// Counter key for `client` in the fixed window containing `now`.
pub fn rate_limit_key(bucket: RateLimitBucket, client: &str, now: DateTime<Utc>) -> String {
    let window = now.timestamp().max(0) as u64 / RATE_LIMIT_WINDOW_SECS;
    format!("ratelimit:{}:{client}:{window}", bucket.as_str())
}

pub struct CheckRateLimitUseCase<S: RateLimitStore> {
    pub store: S,
    /// Requests allowed per window.
    pub limit: u64,
}

impl<S: RateLimitStore> CheckRateLimitUseCase<S> {
    /// Fails open: a store error lets the request through.
    pub async fn execute(
        &self,
        bucket: RateLimitBucket,
        client: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CrmError> {
        let key = rate_limit_key(bucket, client, now);
        let count = match self.store.hit(&key, RATE_LIMIT_WINDOW_SECS).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, bucket = bucket.as_str(), "rate limiter unavailable");
                return Ok(());
            }
        };
        if count > self.limit {
            tracing::debug!(client, bucket = bucket.as_str(), "rate limit exceeded");
            return Err(CrmError::TooManyRequests);
        }
        Ok(())
    }
}
