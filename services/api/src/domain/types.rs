use chrono::{DateTime, Utc};
use uuid::Uuid;

use crm_domain::role::UserRole;
use crm_domain::viewing::{BusinessType, RecordSource, ViewingStatus};

use crate::error::CrmError;

/// Accepted clock skew for `x-timestamp`, either direction.
pub const REQUEST_WINDOW_MS: i64 = 5 * 60 * 1000;
/// How long a seen `(apiKey, nonce, timestamp)` triple is remembered.
pub const NONCE_TTL_SECS: u64 = 2 * (REQUEST_WINDOW_MS as u64) / 1000;
/// Fixed rate-limit window.
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;
/// Row cap for a single spreadsheet export.
pub const EXPORT_MAX_ROWS: u64 = 10_000;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const BCRYPT_COST: u32 = 10;

pub const API_KEY_PREFIX: &str = "ak_";
pub const API_KEY_RANDOM_LEN: usize = 32;
pub const API_SECRET_LEN: usize = 64;

/// Staff account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field changes for a single user. `phone: Some(None)` clears the number.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<Option<String>>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.full_name.is_none()
            && self.phone.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
            && self.password_hash.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive match on username, full name or phone.
    pub keyword: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

/// Ingestion channel credentials. Only the bcrypt hash of the secret is kept.
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub id: Uuid,
    pub channel_name: String,
    pub api_key: String,
    pub api_secret_hash: String,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ApiKeyPatch {
    pub channel_name: Option<String>,
    pub is_active: Option<bool>,
}

/// Channel attached to a request that passed the API-key guard.
#[derive(Debug, Clone)]
pub struct ChannelIdentity {
    pub id: Uuid,
    pub channel_name: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// Lead / viewing appointment.
///
/// `agent_name`, `channel_name` and `property_name` are display values resolved
/// on read; writes ignore them.
#[derive(Debug, Clone)]
pub struct ViewingRecord {
    pub id: Uuid,
    pub tenant_name: String,
    pub primary_phone: Option<String>,
    pub backup_phone: Option<String>,
    pub wechat: Option<String>,
    pub viewing_date: Option<DateTime<Utc>>,
    pub property_id: Option<Uuid>,
    pub room_address: Option<String>,
    pub preferred_location: Option<String>,
    pub budget_range: Option<String>,
    pub requirements: Option<String>,
    pub viewing_status: ViewingStatus,
    pub business_type: BusinessType,
    pub source: RecordSource,
    pub api_key_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub remarks: Option<String>,
    pub viewing_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub agent_name: Option<String>,
    pub channel_name: Option<String>,
    pub property_name: Option<String>,
}

/// Tenant-facing fields shared by the staff and public create paths.
#[derive(Debug, Clone, Default)]
pub struct ViewingRecordDraft {
    pub tenant_name: String,
    pub primary_phone: Option<String>,
    pub backup_phone: Option<String>,
    pub wechat: Option<String>,
    pub viewing_date: Option<DateTime<Utc>>,
    pub property_id: Option<Uuid>,
    pub room_address: Option<String>,
    pub preferred_location: Option<String>,
    pub budget_range: Option<String>,
    pub requirements: Option<String>,
    pub business_type: Option<BusinessType>,
    pub remarks: Option<String>,
}

impl ViewingRecordDraft {
    /// Validate and normalise: trims the tenant name, blank optionals become `None`.
    pub fn validated(mut self) -> Result<Self, CrmError> {
        self.tenant_name = validate_tenant_name(&self.tenant_name)?;
        self.primary_phone = blank_to_none(self.primary_phone);
        self.backup_phone = blank_to_none(self.backup_phone);
        if let Some(ref phone) = self.primary_phone {
            validate_phone(phone)?;
        }
        if let Some(ref phone) = self.backup_phone {
            validate_phone(phone)?;
        }
        self.wechat = blank_to_none(self.wechat);
        self.room_address = blank_to_none(self.room_address);
        self.preferred_location = blank_to_none(self.preferred_location);
        self.budget_range = blank_to_none(self.budget_range);
        self.requirements = blank_to_none(self.requirements);
        self.remarks = blank_to_none(self.remarks);
        Ok(self)
    }

    pub fn into_record(
        self,
        source: RecordSource,
        agent_id: Option<Uuid>,
        api_key_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> ViewingRecord {
        ViewingRecord {
            id: Uuid::now_v7(),
            tenant_name: self.tenant_name,
            primary_phone: self.primary_phone,
            backup_phone: self.backup_phone,
            wechat: self.wechat,
            viewing_date: self.viewing_date,
            property_id: self.property_id,
            room_address: self.room_address,
            preferred_location: self.preferred_location,
            budget_range: self.budget_range,
            requirements: self.requirements,
            viewing_status: ViewingStatus::Pending,
            business_type: self.business_type.unwrap_or_default(),
            source,
            api_key_id,
            agent_id,
            remarks: self.remarks,
            viewing_feedback: None,
            created_at: now,
            updated_at: now,
            agent_name: None,
            channel_name: None,
            property_name: None,
        }
    }
}

/// Field edits. For the `Option<Option<_>>` fields, `Some(None)` clears the column.
#[derive(Debug, Clone, Default)]
pub struct ViewingRecordPatch {
    pub tenant_name: Option<String>,
    pub primary_phone: Option<Option<String>>,
    pub backup_phone: Option<Option<String>>,
    pub wechat: Option<Option<String>>,
    pub viewing_date: Option<Option<DateTime<Utc>>>,
    pub property_id: Option<Option<Uuid>>,
    pub room_address: Option<Option<String>>,
    pub preferred_location: Option<Option<String>>,
    pub budget_range: Option<Option<String>>,
    pub requirements: Option<Option<String>>,
    pub viewing_status: Option<ViewingStatus>,
    pub business_type: Option<BusinessType>,
    pub agent_id: Option<Option<Uuid>>,
    pub remarks: Option<Option<String>>,
    pub viewing_feedback: Option<Option<String>>,
}

impl ViewingRecordPatch {
    pub fn is_empty(&self) -> bool {
        self.tenant_name.is_none()
            && self.primary_phone.is_none()
            && self.backup_phone.is_none()
            && self.wechat.is_none()
            && self.viewing_date.is_none()
            && self.property_id.is_none()
            && self.room_address.is_none()
            && self.preferred_location.is_none()
            && self.budget_range.is_none()
            && self.requirements.is_none()
            && self.viewing_status.is_none()
            && self.business_type.is_none()
            && self.agent_id.is_none()
            && self.remarks.is_none()
            && self.viewing_feedback.is_none()
    }

    pub fn validated(mut self) -> Result<Self, CrmError> {
        if let Some(ref name) = self.tenant_name {
            self.tenant_name = Some(validate_tenant_name(name)?);
        }
        for phone in [&self.primary_phone, &self.backup_phone]
            .into_iter()
            .flatten()
            .flatten()
        {
            validate_phone(phone)?;
        }
        Ok(self)
    }
}

/// List / export / statistics filter. `agent_id` and `api_key_id` double as
/// scope restrictions and are overwritten by the caller's scope.
#[derive(Debug, Clone, Default)]
pub struct ViewingRecordFilter {
    pub viewing_status: Option<ViewingStatus>,
    pub source: Option<RecordSource>,
    pub business_type: Option<BusinessType>,
    pub agent_id: Option<Uuid>,
    pub api_key_id: Option<Uuid>,
    /// Case-insensitive match on tenant name, phones or WeChat id.
    pub keyword: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub date_to: Option<DateTime<Utc>>,
}

/// Per-status record counts for a scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    pub confirmed: u64,
    pub completed: u64,
    pub cancelled: u64,
}

impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.confirmed + self.completed + self.cancelled
    }

    pub fn add(&mut self, status: ViewingStatus, count: u64) {
        match status {
            ViewingStatus::Pending => self.pending += count,
            ViewingStatus::Confirmed => self.confirmed += count,
            ViewingStatus::Completed => self.completed += count,
            ViewingStatus::Cancelled => self.cancelled += count,
        }
    }

    pub fn get(&self, status: ViewingStatus) -> u64 {
        match status {
            ViewingStatus::Pending => self.pending,
            ViewingStatus::Confirmed => self.confirmed,
            ViewingStatus::Completed => self.completed,
            ViewingStatus::Cancelled => self.cancelled,
        }
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Blank or whitespace-only strings become `None`; others are trimmed.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// 3-50 chars of ASCII letters, digits and underscore.
pub fn validate_username(username: &str) -> Result<(), CrmError> {
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(CrmError::validation("username must be 3-50 characters"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(CrmError::validation(
            "username may only contain letters, digits and underscores",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), CrmError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CrmError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// 5-20 digits with an optional leading `+`.
pub fn validate_phone(phone: &str) -> Result<(), CrmError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if !(5..=20).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CrmError::validation(
            "phone must be 5-20 digits with an optional leading +",
        ));
    }
    Ok(())
}

/// Non-empty after trimming, at most `max` characters. Returns the trimmed value.
pub fn validate_text(field: &str, value: &str, max: usize) -> Result<String, CrmError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CrmError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(CrmError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

pub fn validate_full_name(full_name: &str) -> Result<String, CrmError> {
    validate_text("fullName", full_name, 50)
}

pub fn validate_tenant_name(tenant_name: &str) -> Result<String, CrmError> {
    validate_text("tenantName", tenant_name, 50)
}

pub fn validate_channel_name(channel_name: &str) -> Result<String, CrmError> {
    validate_text("channelName", channel_name, 100)
}

/// Reject an empty id list and drop duplicates, keeping first-seen order.
pub fn distinct_ids(ids: &[Uuid]) -> Result<Vec<Uuid>, CrmError> {
    if ids.is_empty() {
        return Err(CrmError::validation("ids must not be empty"));
    }
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    Ok(ids.iter().copied().filter(|id| seen.insert(*id)).collect())
}
