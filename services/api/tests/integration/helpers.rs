use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crm_api::domain::repository::{
    ApiKeyRepository, NonceStore, PropertyRepository, RateLimitStore, RoleRepository,
    UserRepository, ViewingRecordRepository,
};
use crm_api::domain::types::{
    ApiKey, ApiKeyPatch, Property, Role, StatusCounts, User, UserFilter, UserPatch,
    ViewingRecord, ViewingRecordDraft, ViewingRecordFilter, ViewingRecordPatch,
};
use crm_api::error::CrmError;
use crm_api::usecase::password::hash_password;
use crm_domain::pagination::PageRequest;
use crm_domain::role::UserRole;
use crm_domain::viewing::{RecordSource, ViewingStatus};

// ── Shared in-memory tables ──────────────────────────────────────────────────

#[derive(Default)]
pub struct Tables {
    pub users: Vec<User>,
    pub api_keys: Vec<ApiKey>,
    pub properties: Vec<Property>,
    pub records: Vec<ViewingRecord>,
}

/// Handle to one set of tables. Every mock repository built from the same
/// `MockDb` sees the same rows, like repositories sharing a connection.
#[derive(Clone, Default)]
pub struct MockDb {
    pub tables: Arc<Mutex<Tables>>,
}

impl MockDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> MockUserRepo {
        MockUserRepo { db: self.clone() }
    }

    pub fn api_keys(&self) -> MockApiKeyRepo {
        MockApiKeyRepo { db: self.clone() }
    }

    pub fn properties(&self) -> MockPropertyRepo {
        MockPropertyRepo { db: self.clone() }
    }

    pub fn records(&self) -> MockRecordRepo {
        MockRecordRepo { db: self.clone() }
    }

    pub fn insert_user(&self, user: User) -> User {
        self.tables.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn insert_record(&self, record: ViewingRecord) -> ViewingRecord {
        self.tables.lock().unwrap().records.push(record.clone());
        record
    }

    pub fn record(&self, id: Uuid) -> Option<ViewingRecord> {
        self.tables
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.tables
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }
}

fn newest_first<T>(mut rows: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows
}

fn paged<T>(rows: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = rows.len() as u64;
    let items = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.page_size as usize)
        .collect();
    (items, total)
}

// ── MockUserRepo ─────────────────────────────────────────────────────────────

pub struct MockUserRepo {
    pub db: MockDb,
}

impl UserRepository for MockUserRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, CrmError> {
        Ok(self.db.user(id))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|u| u.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), CrmError> {
        let tables = self.db.tables.lock().unwrap();
        let keyword = filter.keyword.as_deref().map(str::to_lowercase);
        let rows: Vec<User> = tables
            .users
            .iter()
            .filter(|u| filter.role.is_none_or(|r| r == u.role))
            .filter(|u| filter.is_active.is_none_or(|a| a == u.is_active))
            .filter(|u| {
                keyword.as_deref().is_none_or(|k| {
                    u.username.to_lowercase().contains(k)
                        || u.full_name.to_lowercase().contains(k)
                        || u.phone.as_deref().is_some_and(|p| p.contains(k))
                })
            })
            .cloned()
            .collect();
        Ok(paged(newest_first(rows, |u| u.created_at), page))
    }

    async fn list_active_by_role(&self, role: UserRole) -> Result<Vec<User>, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .filter(|u| u.role == role && u.is_active)
            .cloned()
            .collect())
    }

    async fn exists_with_role(&self, role: UserRole) -> Result<bool, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(tables.users.iter().any(|u| u.role == role))
    }

    async fn create(&self, user: &User) -> Result<(), CrmError> {
        self.db.tables.lock().unwrap().users.push(user.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<(), CrmError> {
        let mut tables = self.db.tables.lock().unwrap();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(CrmError::UserNotFound)?;
        if let Some(ref username) = patch.username {
            user.username = username.clone();
        }
        if let Some(ref full_name) = patch.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(ref phone) = patch.phone {
            user.phone = phone.clone();
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        if let Some(ref hash) = patch.password_hash {
            user.password_hash = hash.clone();
        }
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn count_owned_records(&self, ids: &[Uuid]) -> Result<u64, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(tables
            .records
            .iter()
            .filter(|r| r.agent_id.is_some_and(|a| ids.contains(&a)))
            .count() as u64)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CrmError> {
        let mut tables = self.db.tables.lock().unwrap();
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        Ok(tables.users.len() != before)
    }

    async fn batch_update(
        &self,
        ids: &[Uuid],
        is_active: Option<bool>,
        role: Option<UserRole>,
    ) -> Result<u64, CrmError> {
        let mut tables = self.db.tables.lock().unwrap();
        if !ids.iter().all(|id| tables.users.iter().any(|u| u.id == *id)) {
            return Err(CrmError::UserNotFound);
        }
        let now = Utc::now();
        let mut updated = 0;
        for user in tables.users.iter_mut().filter(|u| ids.contains(&u.id)) {
            if let Some(is_active) = is_active {
                user.is_active = is_active;
            }
            if let Some(role) = role {
                user.role = role;
            }
            user.updated_at = now;
            updated += 1;
        }
        Ok(updated)
    }

    async fn batch_delete(&self, ids: &[Uuid]) -> Result<u64, CrmError> {
        let mut tables = self.db.tables.lock().unwrap();
        if !ids.iter().all(|id| tables.users.iter().any(|u| u.id == *id)) {
            return Err(CrmError::UserNotFound);
        }
        if tables
            .records
            .iter()
            .any(|r| r.agent_id.is_some_and(|a| ids.contains(&a)))
        {
            return Err(CrmError::UserHasRecords);
        }
        let before = tables.users.len();
        tables.users.retain(|u| !ids.contains(&u.id));
        Ok((before - tables.users.len()) as u64)
    }
}

// ── MockRoleRepo ─────────────────────────────────────────────────────────────

pub struct MockRoleRepo;

impl RoleRepository for MockRoleRepo {
    async fn list(&self) -> Result<Vec<Role>, CrmError> {
        Ok(UserRole::ALL
            .into_iter()
            .enumerate()
            .map(|(i, role)| Role {
                id: i as i32 + 1,
                name: role.as_str().to_owned(),
                description: None,
            })
            .collect())
    }
}

// ── MockApiKeyRepo ───────────────────────────────────────────────────────────

pub struct MockApiKeyRepo {
    pub db: MockDb,
}

impl MockApiKeyRepo {
    fn with_key<T>(&self, id: Uuid, f: impl FnOnce(&mut ApiKey) -> T) -> Result<T, CrmError> {
        let mut tables = self.db.tables.lock().unwrap();
        let key = tables
            .api_keys
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or(CrmError::ApiKeyNotFound)?;
        Ok(f(key))
    }
}

impl ApiKeyRepository for MockApiKeyRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApiKey>, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(tables.api_keys.iter().find(|k| k.id == id).cloned())
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<ApiKey>, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(tables.api_keys.iter().find(|k| k.api_key == api_key).cloned())
    }

    async fn find_by_channel_name(
        &self,
        channel_name: &str,
    ) -> Result<Option<ApiKey>, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(tables
            .api_keys
            .iter()
            .find(|k| k.channel_name == channel_name)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<ApiKey>, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(newest_first(tables.api_keys.clone(), |k| k.created_at))
    }

    async fn create(&self, key: &ApiKey) -> Result<(), CrmError> {
        self.db.tables.lock().unwrap().api_keys.push(key.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &ApiKeyPatch) -> Result<(), CrmError> {
        self.with_key(id, |key| {
            if let Some(ref name) = patch.channel_name {
                key.channel_name = name.clone();
            }
            if let Some(is_active) = patch.is_active {
                key.is_active = is_active;
            }
            key.updated_at = Utc::now();
        })
    }

    async fn rotate(&self, id: Uuid, api_key: &str, secret_hash: &str) -> Result<(), CrmError> {
        self.with_key(id, |key| {
            key.api_key = api_key.to_owned();
            key.api_secret_hash = secret_hash.to_owned();
            key.updated_at = Utc::now();
        })
    }

    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), CrmError> {
        self.with_key(id, |key| key.last_used_at = Some(at))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CrmError> {
        let mut tables = self.db.tables.lock().unwrap();
        let before = tables.api_keys.len();
        tables.api_keys.retain(|k| k.id != id);
        for record in tables.records.iter_mut() {
            if record.api_key_id == Some(id) {
                record.api_key_id = None;
            }
        }
        Ok(tables.api_keys.len() != before)
    }
}

// ── MockPropertyRepo ─────────────────────────────────────────────────────────

pub struct MockPropertyRepo {
    pub db: MockDb,
}

impl PropertyRepository for MockPropertyRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(tables.properties.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Property>, CrmError> {
        Ok(self.db.tables.lock().unwrap().properties.clone())
    }

    async fn create(&self, property: &Property) -> Result<(), CrmError> {
        self.db
            .tables
            .lock()
            .unwrap()
            .properties
            .push(property.clone());
        Ok(())
    }
}

// ── MockRecordRepo ───────────────────────────────────────────────────────────

pub struct MockRecordRepo {
    pub db: MockDb,
}

/// In-memory equivalent of the filtered record query.
fn record_matches(filter: &ViewingRecordFilter, record: &ViewingRecord) -> bool {
    if filter.viewing_status.is_some_and(|s| s != record.viewing_status)
        || filter.source.is_some_and(|s| s != record.source)
        || filter.business_type.is_some_and(|b| b != record.business_type)
        || filter.agent_id.is_some_and(|a| Some(a) != record.agent_id)
        || filter.api_key_id.is_some_and(|k| Some(k) != record.api_key_id)
        || filter.date_from.is_some_and(|from| record.created_at < from)
        || filter.date_to.is_some_and(|to| record.created_at > to)
    {
        return false;
    }
    match filter.keyword.as_deref() {
        Some(keyword) => {
            let keyword = keyword.to_lowercase();
            [
                Some(&record.tenant_name),
                record.primary_phone.as_ref(),
                record.backup_phone.as_ref(),
                record.wechat.as_ref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&keyword))
        }
        None => true,
    }
}

fn apply_patch(patch: &ViewingRecordPatch, record: &mut ViewingRecord, now: DateTime<Utc>) {
    fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
        if let Some(v) = value {
            *slot = v.clone();
        }
    }
    set(&mut record.tenant_name, &patch.tenant_name);
    set(&mut record.primary_phone, &patch.primary_phone);
    set(&mut record.backup_phone, &patch.backup_phone);
    set(&mut record.wechat, &patch.wechat);
    set(&mut record.viewing_date, &patch.viewing_date);
    set(&mut record.property_id, &patch.property_id);
    set(&mut record.room_address, &patch.room_address);
    set(&mut record.preferred_location, &patch.preferred_location);
    set(&mut record.budget_range, &patch.budget_range);
    set(&mut record.requirements, &patch.requirements);
    set(&mut record.viewing_status, &patch.viewing_status);
    set(&mut record.business_type, &patch.business_type);
    set(&mut record.agent_id, &patch.agent_id);
    set(&mut record.remarks, &patch.remarks);
    set(&mut record.viewing_feedback, &patch.viewing_feedback);
    record.updated_at = now;
}

/// Resolve the display names a joined query would return.
fn hydrate(tables: &Tables, mut record: ViewingRecord) -> ViewingRecord {
    record.agent_name = record
        .agent_id
        .and_then(|id| tables.users.iter().find(|u| u.id == id))
        .map(|u| u.full_name.clone());
    record.channel_name = record
        .api_key_id
        .and_then(|id| tables.api_keys.iter().find(|k| k.id == id))
        .map(|k| k.channel_name.clone());
    record.property_name = record
        .property_id
        .and_then(|id| tables.properties.iter().find(|p| p.id == id))
        .map(|p| p.name.clone());
    record
}

fn matching(tables: &Tables, filter: &ViewingRecordFilter) -> Vec<ViewingRecord> {
    let rows = tables
        .records
        .iter()
        .filter(|r| record_matches(filter, r))
        .cloned()
        .map(|r| hydrate(tables, r))
        .collect();
    newest_first(rows, |r| r.created_at)
}

impl ViewingRecordRepository for MockRecordRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ViewingRecord>, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(tables
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .map(|r| hydrate(&tables, r)))
    }

    async fn list(
        &self,
        filter: &ViewingRecordFilter,
        page: PageRequest,
    ) -> Result<(Vec<ViewingRecord>, u64), CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(paged(matching(&tables, filter), page))
    }

    async fn list_all(
        &self,
        filter: &ViewingRecordFilter,
        limit: u64,
    ) -> Result<Vec<ViewingRecord>, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        Ok(matching(&tables, filter)
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn count_by_status(
        &self,
        filter: &ViewingRecordFilter,
    ) -> Result<StatusCounts, CrmError> {
        let tables = self.db.tables.lock().unwrap();
        let mut counts = StatusCounts::default();
        for record in tables.records.iter().filter(|r| record_matches(filter, r)) {
            counts.add(record.viewing_status, 1);
        }
        Ok(counts)
    }

    async fn create(&self, record: &ViewingRecord) -> Result<(), CrmError> {
        self.db.tables.lock().unwrap().records.push(record.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &ViewingRecordPatch) -> Result<(), CrmError> {
        let mut tables = self.db.tables.lock().unwrap();
        let record = tables
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(CrmError::RecordNotFound)?;
        apply_patch(patch, record, Utc::now());
        Ok(())
    }

    async fn batch_update_status(
        &self,
        ids: &[Uuid],
        agent_id: Option<Uuid>,
        status: ViewingStatus,
    ) -> Result<Option<u64>, CrmError> {
        let mut tables = self.db.tables.lock().unwrap();
        let accessible = tables
            .records
            .iter()
            .filter(|r| ids.contains(&r.id))
            .filter(|r| agent_id.is_none_or(|a| r.agent_id == Some(a)))
            .count();
        if accessible != ids.len() {
            return Ok(None);
        }
        let now = Utc::now();
        for record in tables.records.iter_mut().filter(|r| ids.contains(&r.id)) {
            record.viewing_status = status;
            record.updated_at = now;
        }
        Ok(Some(accessible as u64))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CrmError> {
        let mut tables = self.db.tables.lock().unwrap();
        let before = tables.records.len();
        tables.records.retain(|r| r.id != id);
        Ok(tables.records.len() != before)
    }
}

// ── MockNonceStore / MockRateLimitStore ──────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockNonceStore {
    pub seen: Arc<Mutex<HashSet<String>>>,
}

impl NonceStore for MockNonceStore {
    async fn remember(&self, key: &str, _ttl_secs: u64) -> Result<bool, CrmError> {
        Ok(self.seen.lock().unwrap().insert(key.to_owned()))
    }
}

#[derive(Clone, Default)]
pub struct MockRateLimitStore {
    pub counts: Arc<Mutex<HashMap<String, u64>>>,
}

impl RateLimitStore for MockRateLimitStore {
    async fn hit(&self, key: &str, _window_secs: u64) -> Result<u64, CrmError> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(key.to_owned()).or_default();
        *count += 1;
        Ok(*count)
    }
}

/// A counter store that is always down.
pub struct FailingRateLimitStore;

impl RateLimitStore for FailingRateLimitStore {
    async fn hit(&self, _key: &str, _window_secs: u64) -> Result<u64, CrmError> {
        Err(CrmError::Internal(anyhow::anyhow!("redis unreachable")))
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub const TEST_PASSWORD: &str = "secret123";

/// A user whose password is [`TEST_PASSWORD`].
pub async fn test_user(username: &str, role: UserRole) -> User {
    let now = Utc::now();
    User {
        id: Uuid::now_v7(),
        username: username.to_owned(),
        password_hash: hash_password(TEST_PASSWORD).await.unwrap(),
        full_name: format!("{username} full name"),
        phone: None,
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// A user row whose hash is never verified. Skips bcrypt for speed.
pub fn plain_user(username: &str, role: UserRole) -> User {
    let now = Utc::now();
    User {
        id: Uuid::now_v7(),
        username: username.to_owned(),
        password_hash: "unused".into(),
        full_name: format!("{username} full name"),
        phone: None,
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_record(tenant_name: &str, agent_id: Option<Uuid>) -> ViewingRecord {
    ViewingRecordDraft {
        tenant_name: tenant_name.to_owned(),
        ..Default::default()
    }
    .into_record(RecordSource::Manual, agent_id, None, Utc::now())
}
