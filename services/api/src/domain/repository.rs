#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crm_domain::pagination::PageRequest;
use crm_domain::role::UserRole;
use crm_domain::viewing::ViewingStatus;

use crate::domain::types::{
    ApiKey, ApiKeyPatch, Property, Role, StatusCounts, User, UserFilter, UserPatch, ViewingRecord,
    ViewingRecordFilter, ViewingRecordPatch,
};
use crate::error::CrmError;

/// Repository for staff accounts.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, CrmError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, CrmError>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, CrmError>;

    /// Filtered page ordered by `created_at` descending, plus the total match count.
    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), CrmError>;

    async fn list_active_by_role(&self, role: UserRole) -> Result<Vec<User>, CrmError>;
    async fn exists_with_role(&self, role: UserRole) -> Result<bool, CrmError>;

    async fn create(&self, user: &User) -> Result<(), CrmError>;
    async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<(), CrmError>;

    /// Number of viewing records owned (as agent) by any of `ids`.
    async fn count_owned_records(&self, ids: &[Uuid]) -> Result<u64, CrmError>;

    /// Delete a user. Returns `true` if a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, CrmError>;

    /// Apply the same status / role change to every id in one transaction.
    /// Fails with `UserNotFound` and changes nothing unless all ids exist.
    async fn batch_update(
        &self,
        ids: &[Uuid],
        is_active: Option<bool>,
        role: Option<UserRole>,
    ) -> Result<u64, CrmError>;

    /// Delete every id in one transaction. Fails with `UserNotFound` or
    /// `UserHasRecords` and deletes nothing unless all ids exist and none own records.
    async fn batch_delete(&self, ids: &[Uuid]) -> Result<u64, CrmError>;
}

/// Repository for the static role table.
pub trait RoleRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Role>, CrmError>;
}

/// Repository for ingestion-channel credentials.
pub trait ApiKeyRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApiKey>, CrmError>;
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<ApiKey>, CrmError>;
    async fn find_by_channel_name(&self, channel_name: &str)
    -> Result<Option<ApiKey>, CrmError>;
    async fn list(&self) -> Result<Vec<ApiKey>, CrmError>;
    async fn create(&self, key: &ApiKey) -> Result<(), CrmError>;
    async fn update(&self, id: Uuid, patch: &ApiKeyPatch) -> Result<(), CrmError>;

    /// Replace the public key and secret hash.
    async fn rotate(&self, id: Uuid, api_key: &str, secret_hash: &str) -> Result<(), CrmError>;

    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), CrmError>;

    /// Delete a key. Returns `true` if a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, CrmError>;
}

/// Repository for properties.
pub trait PropertyRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, CrmError>;
    async fn list(&self) -> Result<Vec<Property>, CrmError>;
    async fn create(&self, property: &Property) -> Result<(), CrmError>;
}

/// Repository for viewing records.
pub trait ViewingRecordRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ViewingRecord>, CrmError>;

    /// Filtered page ordered by `created_at` descending, plus the total match count.
    async fn list(
        &self,
        filter: &ViewingRecordFilter,
        page: PageRequest,
    ) -> Result<(Vec<ViewingRecord>, u64), CrmError>;

    /// Up to `limit` matches ordered by `created_at` descending.
    async fn list_all(
        &self,
        filter: &ViewingRecordFilter,
        limit: u64,
    ) -> Result<Vec<ViewingRecord>, CrmError>;

    async fn count_by_status(&self, filter: &ViewingRecordFilter)
    -> Result<StatusCounts, CrmError>;

    async fn create(&self, record: &ViewingRecord) -> Result<(), CrmError>;
    async fn update(&self, id: Uuid, patch: &ViewingRecordPatch) -> Result<(), CrmError>;

    /// Set `status` on every id in one transaction, restricted to `agent_id` when
    /// given. Returns `None` and changes nothing unless every id is accessible.
    async fn batch_update_status(
        &self,
        ids: &[Uuid],
        agent_id: Option<Uuid>,
        status: ViewingStatus,
    ) -> Result<Option<u64>, CrmError>;

    /// Delete a record. Returns `true` if a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, CrmError>;
}

/// Replay-protection store for API-key requests.
pub trait NonceStore: Send + Sync {
    /// Remember `key` for `ttl_secs`. Returns `false` if it was already present.
    async fn remember(&self, key: &str, ttl_secs: u64) -> Result<bool, CrmError>;
}

/// Fixed-window request counters.
pub trait RateLimitStore: Send + Sync {
    /// Increment the counter for `key`, expiring it after `window_secs`.
    /// Returns the count including this hit.
    async fn hit(&self, key: &str, window_secs: u64) -> Result<u64, CrmError>;
}
