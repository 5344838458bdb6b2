use axum::extract::FromRef;
use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use crm_auth_types::identity::JwtSecret;

use crate::infra::cache::{RedisNonceStore, RedisRateLimitStore};
use crate::infra::db::{
    DbApiKeyRepository, DbPropertyRepository, DbRoleRepository, DbUserRepository,
    DbViewingRecordRepository,
};

/// Requests per minute for each rate-limit bucket.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub default_per_minute: u64,
    pub sensitive_per_minute: u64,
    /// Whether the first `x-forwarded-for` hop identifies the client.
    pub trust_forwarded_for: bool,
}

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub jwt_secret: JwtSecret,
    pub jwt_ttl_secs: u64,
    pub rate_limits: RateLimits,
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_secret.clone()
    }
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn role_repo(&self) -> DbRoleRepository {
        DbRoleRepository {
            db: self.db.clone(),
        }
    }

    pub fn api_key_repo(&self) -> DbApiKeyRepository {
        DbApiKeyRepository {
            db: self.db.clone(),
        }
    }

    pub fn property_repo(&self) -> DbPropertyRepository {
        DbPropertyRepository {
            db: self.db.clone(),
        }
    }

    pub fn record_repo(&self) -> DbViewingRecordRepository {
        DbViewingRecordRepository {
            db: self.db.clone(),
        }
    }

    pub fn nonce_store(&self) -> RedisNonceStore {
        RedisNonceStore {
            pool: self.redis.clone(),
        }
    }

    pub fn rate_limit_store(&self) -> RedisRateLimitStore {
        RedisRateLimitStore {
            pool: self.redis.clone(),
        }
    }
}
