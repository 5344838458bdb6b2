//! API-key guard for the public ingestion routes.

use chrono::{DateTime, Utc};

use crate::domain::repository::{ApiKeyRepository, NonceStore};
use crate::domain::types::{ChannelIdentity, NONCE_TTL_SECS, REQUEST_WINDOW_MS};
use crate::error::CrmError;
use crate::usecase::password::verify_password;

/// Raw guard headers: `x-api-key`, `x-api-secret`, `x-timestamp`, `x-nonce`.
#[derive(Debug, Default, Clone)]
pub struct ChannelCredentials {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Unix epoch milliseconds.
    pub timestamp: Option<String>,
    pub nonce: Option<String>,
}

/// Replay key for one request. Scoped to the parsed timestamp, so a nonce may
/// be reused with a different timestamp but not with a re-spelled one.
pub fn nonce_key(api_key: &str, nonce: &str, timestamp: i64) -> String {
    format!("nonce:{api_key}:{nonce}:{timestamp}")
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

pub struct AuthenticateChannelUseCase<K, N>
where
    K: ApiKeyRepository,
    N: NonceStore,
{
    pub keys: K,
    pub nonces: N,
}

impl<K, N> AuthenticateChannelUseCase<K, N>
where
    K: ApiKeyRepository,
    N: NonceStore,
{
    /// Checks run in a fixed order: presence, freshness, replay, key, secret.
    pub async fn execute(
        &self,
        credentials: &ChannelCredentials,
        now: DateTime<Utc>,
    ) -> Result<ChannelIdentity, CrmError> {
        let (Some(api_key), Some(api_secret), Some(timestamp), Some(nonce)) = (
            present(credentials.api_key.as_ref()),
            present(credentials.api_secret.as_ref()),
            present(credentials.timestamp.as_ref()),
            present(credentials.nonce.as_ref()),
        ) else {
            return Err(CrmError::MissingApiCredentials);
        };

        let sent_at: i64 = timestamp.parse().map_err(|_| CrmError::RequestExpired)?;
        if now.timestamp_millis().abs_diff(sent_at) > REQUEST_WINDOW_MS as u64 {
            return Err(CrmError::RequestExpired);
        }

        let key = nonce_key(api_key, nonce, sent_at);
        if !self.nonces.remember(&key, NONCE_TTL_SECS).await? {
            return Err(CrmError::DuplicateRequest);
        }

        let record = match self.keys.find_by_api_key(api_key).await? {
            Some(record) if record.is_active => record,
            _ => return Err(CrmError::InvalidApiKey),
        };

        if !verify_password(api_secret, &record.api_secret_hash).await? {
            return Err(CrmError::InvalidApiSecret);
        }

        if let Err(e) = self.keys.touch_last_used(record.id, now).await {
            tracing::warn!(error = %e, api_key_id = %record.id, "failed to record api key usage");
        }

        tracing::debug!(channel = %record.channel_name, "channel authenticated");
        Ok(ChannelIdentity {
            id: record.id,
            channel_name: record.channel_name,
            api_key: record.api_key,
        })
    }
}
