use chrono::Utc;
use uuid::Uuid;

use crate::domain::repository::ApiKeyRepository;
use crate::domain::types::{
    API_KEY_PREFIX, API_KEY_RANDOM_LEN, API_SECRET_LEN, ApiKey, ApiKeyPatch,
    validate_channel_name,
};
use crate::error::CrmError;
use crate::usecase::password::{hash_password, random_alphanumeric};

/// Public key identifier: `ak_` followed by 32 alphanumerics.
pub fn generate_api_key() -> String {
    format!("{API_KEY_PREFIX}{}", random_alphanumeric(API_KEY_RANDOM_LEN))
}

pub fn generate_api_secret() -> String {
    random_alphanumeric(API_SECRET_LEN)
}

/// A key together with its plaintext secret, returned exactly once.
#[derive(Debug)]
pub struct IssuedApiKey {
    pub key: ApiKey,
    pub api_secret: String,
}

async fn find_key<K: ApiKeyRepository>(keys: &K, id: Uuid) -> Result<ApiKey, CrmError> {
    keys.find_by_id(id).await?.ok_or(CrmError::ApiKeyNotFound)
}

// ── ListApiKeys ──────────────────────────────────────────────────────────────

pub struct ListApiKeysUseCase<K: ApiKeyRepository> {
    pub keys: K,
}

impl<K: ApiKeyRepository> ListApiKeysUseCase<K> {
    pub async fn execute(&self) -> Result<Vec<ApiKey>, CrmError> {
        self.keys.list().await
    }
}

// ── GetApiKey ────────────────────────────────────────────────────────────────

pub struct GetApiKeyUseCase<K: ApiKeyRepository> {
    pub keys: K,
}

impl<K: ApiKeyRepository> GetApiKeyUseCase<K> {
    pub async fn execute(&self, id: Uuid) -> Result<ApiKey, CrmError> {
        find_key(&self.keys, id).await
    }
}

// ── CreateApiKey ─────────────────────────────────────────────────────────────

pub struct CreateApiKeyUseCase<K: ApiKeyRepository> {
    pub keys: K,
}

impl<K: ApiKeyRepository> CreateApiKeyUseCase<K> {
    pub async fn execute(&self, actor: Uuid, channel_name: &str) -> Result<IssuedApiKey, CrmError> {
        let channel_name = validate_channel_name(channel_name)?;
        if self
            .keys
            .find_by_channel_name(&channel_name)
            .await?
            .is_some()
        {
            return Err(CrmError::ChannelNameTaken);
        }

        let api_secret = generate_api_secret();
        let now = Utc::now();
        let key = ApiKey {
            id: Uuid::now_v7(),
            channel_name,
            api_key: generate_api_key(),
            api_secret_hash: hash_password(&api_secret).await?,
            is_active: true,
            created_by: Some(actor),
            last_used_at: None,
            created_at: now,
            updated_at: now,
        };
        self.keys.create(&key).await?;
        tracing::info!(api_key_id = %key.id, channel = %key.channel_name, "api key created");
        Ok(IssuedApiKey { key, api_secret })
    }
}

// ── UpdateApiKey ─────────────────────────────────────────────────────────────

pub struct UpdateApiKeyUseCase<K: ApiKeyRepository> {
    pub keys: K,
}

impl<K: ApiKeyRepository> UpdateApiKeyUseCase<K> {
    pub async fn execute(&self, id: Uuid, input: ApiKeyPatch) -> Result<ApiKey, CrmError> {
        let existing = find_key(&self.keys, id).await?;

        let mut patch = ApiKeyPatch {
            is_active: input.is_active,
            ..Default::default()
        };
        if let Some(ref name) = input.channel_name {
            let name = validate_channel_name(name)?;
            if name != existing.channel_name {
                if let Some(other) = self.keys.find_by_channel_name(&name).await? {
                    if other.id != id {
                        return Err(CrmError::ChannelNameTaken);
                    }
                }
                patch.channel_name = Some(name);
            }
        }

        if patch.channel_name.is_some() || patch.is_active.is_some() {
            self.keys.update(id, &patch).await?;
        }
        find_key(&self.keys, id).await
    }
}

// ── RegenerateApiKey ─────────────────────────────────────────────────────────

pub struct RegenerateApiKeyUseCase<K: ApiKeyRepository> {
    pub keys: K,
}

impl<K: ApiKeyRepository> RegenerateApiKeyUseCase<K> {
    /// Issue a fresh key and secret; the previous pair stops working immediately.
    pub async fn execute(&self, id: Uuid) -> Result<IssuedApiKey, CrmError> {
        find_key(&self.keys, id).await?;
        let api_key = generate_api_key();
        let api_secret = generate_api_secret();
        let secret_hash = hash_password(&api_secret).await?;
        self.keys.rotate(id, &api_key, &secret_hash).await?;
        tracing::info!(api_key_id = %id, "api key regenerated");
        Ok(IssuedApiKey {
            key: find_key(&self.keys, id).await?,
            api_secret,
        })
    }
}

// ── DeleteApiKey ─────────────────────────────────────────────────────────────

pub struct DeleteApiKeyUseCase<K: ApiKeyRepository> {
    pub keys: K,
}

impl<K: ApiKeyRepository> DeleteApiKeyUseCase<K> {
    pub async fn execute(&self, id: Uuid) -> Result<(), CrmError> {
        if !self.keys.delete(id).await? {
            return Err(CrmError::ApiKeyNotFound);
        }
        tracing::info!(api_key_id = %id, "api key deleted");
        Ok(())
    }
}
