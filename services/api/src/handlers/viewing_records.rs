use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crm_auth_types::identity::Identity;
use crm_domain::pagination::{Page, PageRequest};
use crm_domain::role::UserRole;
use crm_domain::viewing::{BusinessType, RecordSource, ViewingStatus};

use crate::domain::policy::RecordScope;
use crate::domain::types::{
    StatusCounts, ViewingRecord, ViewingRecordDraft, ViewingRecordFilter, ViewingRecordPatch,
};
use crate::error::CrmError;
use crate::handlers::users::UpdatedResponse;
use crate::handlers::{parse_date_bound, parse_query, patch_text};
use crate::state::AppState;
use crate::usecase::viewing_records::{
    BatchUpdateStatusUseCase, CreateRecordInput, CreateRecordUseCase, DeleteRecordUseCase,
    GetRecordUseCase, ListRecordsUseCase, RecordStatisticsUseCase, UpdateRecordStatusUseCase,
    UpdateRecordUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewingRecordResponse {
    pub id: Uuid,
    pub tenant_name: String,
    pub primary_phone: Option<String>,
    pub backup_phone: Option<String>,
    pub wechat: Option<String>,
    #[serde(serialize_with = "crm_core::serde::to_rfc3339_ms_opt")]
    pub viewing_date: Option<DateTime<Utc>>,
    pub property_id: Option<Uuid>,
    pub property_name: Option<String>,
    pub room_address: Option<String>,
    pub preferred_location: Option<String>,
    pub budget_range: Option<String>,
    pub requirements: Option<String>,
    pub viewing_status: ViewingStatus,
    pub business_type: BusinessType,
    pub source: RecordSource,
    pub api_key_id: Option<Uuid>,
    pub channel_name: Option<String>,
    pub agent_id: Option<Uuid>,
    pub agent_name: Option<String>,
    pub remarks: Option<String>,
    pub viewing_feedback: Option<String>,
    #[serde(serialize_with = "crm_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "crm_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<ViewingRecord> for ViewingRecordResponse {
    fn from(r: ViewingRecord) -> Self {
        Self {
            id: r.id,
            tenant_name: r.tenant_name,
            primary_phone: r.primary_phone,
            backup_phone: r.backup_phone,
            wechat: r.wechat,
            viewing_date: r.viewing_date,
            property_id: r.property_id,
            property_name: r.property_name,
            room_address: r.room_address,
            preferred_location: r.preferred_location,
            budget_range: r.budget_range,
            requirements: r.requirements,
            viewing_status: r.viewing_status,
            business_type: r.business_type,
            source: r.source,
            api_key_id: r.api_key_id,
            channel_name: r.channel_name,
            agent_id: r.agent_id,
            agent_name: r.agent_name,
            remarks: r.remarks,
            viewing_feedback: r.viewing_feedback,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct StatisticsResponse {
    pub total: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub completed: u64,
    pub cancelled: u64,
}

impl From<StatusCounts> for StatisticsResponse {
    fn from(c: StatusCounts) -> Self {
        Self {
            total: c.total(),
            pending: c.pending,
            confirmed: c.confirmed,
            completed: c.completed,
            cancelled: c.cancelled,
        }
    }
}

// ── Query params ─────────────────────────────────────────────────────────────

/// Filters shared by the list, statistics and export endpoints. Values stay
/// raw strings so bad input surfaces as `VALIDATION_ERROR`.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecordListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub viewing_status: Option<String>,
    pub source: Option<String>,
    pub business_type: Option<String>,
    pub agent_id: Option<String>,
    pub keyword: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl RecordListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page, self.page_size)
    }

    pub fn filter(&self) -> Result<ViewingRecordFilter, CrmError> {
        Ok(ViewingRecordFilter {
            viewing_status: parse_query("viewingStatus", self.viewing_status.as_deref())?,
            source: parse_query("source", self.source.as_deref())?,
            business_type: parse_query("businessType", self.business_type.as_deref())?,
            agent_id: parse_query("agentId", self.agent_id.as_deref())?,
            api_key_id: None,
            keyword: self
                .keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned),
            date_from: parse_date_bound("dateFrom", self.date_from.as_deref(), false)?,
            date_to: parse_date_bound("dateTo", self.date_to.as_deref(), true)?,
        })
    }
}

// ── Request bodies ───────────────────────────────────────────────────────────

/// Lead details accepted on create, from staff and from channels.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraftBody {
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

impl From<RecordDraftBody> for ViewingRecordDraft {
    fn from(b: RecordDraftBody) -> Self {
        Self {
            tenant_name: b.tenant_name,
            primary_phone: b.primary_phone,
            backup_phone: b.backup_phone,
            wechat: b.wechat,
            viewing_date: b.viewing_date,
            property_id: b.property_id,
            room_address: b.room_address,
            preferred_location: b.preferred_location,
            budget_range: b.budget_range,
            requirements: b.requirements,
            business_type: b.business_type,
            remarks: b.remarks,
        }
    }
}

/// Partial edit. Blank text clears a column, and `null` clears the date,
/// property and agent. Absent fields are untouched.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    pub tenant_name: Option<String>,
    pub primary_phone: Option<String>,
    pub backup_phone: Option<String>,
    pub wechat: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub viewing_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub property_id: Option<Option<Uuid>>,
    pub room_address: Option<String>,
    pub preferred_location: Option<String>,
    pub budget_range: Option<String>,
    pub requirements: Option<String>,
    pub viewing_status: Option<ViewingStatus>,
    pub business_type: Option<BusinessType>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub agent_id: Option<Option<Uuid>>,
    pub remarks: Option<String>,
    pub viewing_feedback: Option<String>,
}

impl From<UpdateRecordRequest> for ViewingRecordPatch {
    fn from(b: UpdateRecordRequest) -> Self {
        Self {
            tenant_name: b.tenant_name,
            primary_phone: patch_text(b.primary_phone),
            backup_phone: patch_text(b.backup_phone),
            wechat: patch_text(b.wechat),
            viewing_date: b.viewing_date,
            property_id: b.property_id,
            room_address: patch_text(b.room_address),
            preferred_location: patch_text(b.preferred_location),
            budget_range: patch_text(b.budget_range),
            requirements: patch_text(b.requirements),
            viewing_status: b.viewing_status,
            business_type: b.business_type,
            agent_id: b.agent_id,
            remarks: patch_text(b.remarks),
            viewing_feedback: patch_text(b.viewing_feedback),
        }
    }
}

// ── GET /api/viewing-records ─────────────────────────────────────────────────

pub async fn list_records(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<RecordListQuery>,
) -> Result<Json<Page<ViewingRecordResponse>>, CrmError> {
    let usecase = ListRecordsUseCase {
        records: state.record_repo(),
    };
    let page = usecase
        .execute(
            RecordScope::for_identity(&identity),
            query.filter()?,
            query.page_request(),
        )
        .await?;
    Ok(Json(page.map(ViewingRecordResponse::from)))
}

// ── GET /api/viewing-records/statistics ──────────────────────────────────────

pub async fn record_statistics(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<RecordListQuery>,
) -> Result<Json<StatisticsResponse>, CrmError> {
    let usecase = RecordStatisticsUseCase {
        records: state.record_repo(),
    };
    let counts = usecase
        .execute(RecordScope::for_identity(&identity), query.filter()?)
        .await?;
    Ok(Json(counts.into()))
}

// ── GET /api/viewing-records/{id} ────────────────────────────────────────────

pub async fn get_record(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ViewingRecordResponse>, CrmError> {
    let usecase = GetRecordUseCase {
        records: state.record_repo(),
    };
    let record = usecase
        .execute(RecordScope::for_identity(&identity), id)
        .await?;
    Ok(Json(record.into()))
}

// ── POST /api/viewing-records ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    #[serde(flatten)]
    pub draft: RecordDraftBody,
    pub agent_id: Option<Uuid>,
}

pub async fn create_record(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<ViewingRecordResponse>), CrmError> {
    let usecase = CreateRecordUseCase {
        records: state.record_repo(),
        users: state.user_repo(),
        properties: state.property_repo(),
    };
    let record = usecase
        .execute(
            RecordScope::for_identity(&identity),
            CreateRecordInput {
                draft: body.draft.into(),
                agent_id: body.agent_id,
            },
        )
        .await?;
    tracing::info!(record_id = %record.id, user_id = %identity.user_id, "record created");
    Ok((StatusCode::CREATED, Json(record.into())))
}

// ── PATCH /api/viewing-records/{id} ──────────────────────────────────────────

pub async fn update_record(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRecordRequest>,
) -> Result<Json<ViewingRecordResponse>, CrmError> {
    let usecase = UpdateRecordUseCase {
        records: state.record_repo(),
        users: state.user_repo(),
        properties: state.property_repo(),
    };
    let record = usecase
        .execute(RecordScope::for_identity(&identity), id, body.into())
        .await?;
    Ok(Json(record.into()))
}

// ── PATCH /api/viewing-records/{id}/status ───────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub viewing_status: ViewingStatus,
    pub viewing_feedback: Option<String>,
}

pub async fn update_record_status(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<ViewingRecordResponse>, CrmError> {
    let usecase = UpdateRecordStatusUseCase {
        records: state.record_repo(),
    };
    let record = usecase
        .execute(
            RecordScope::for_identity(&identity),
            id,
            body.viewing_status,
            body.viewing_feedback,
        )
        .await?;
    Ok(Json(record.into()))
}

// ── POST /api/viewing-records/batch-status ───────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusRequest {
    pub ids: Vec<Uuid>,
    pub viewing_status: ViewingStatus,
}

pub async fn batch_update_status(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<BatchStatusRequest>,
) -> Result<Json<UpdatedResponse>, CrmError> {
    let usecase = BatchUpdateStatusUseCase {
        records: state.record_repo(),
    };
    let updated = usecase
        .execute(
            RecordScope::for_identity(&identity),
            &body.ids,
            body.viewing_status,
        )
        .await?;
    Ok(Json(UpdatedResponse { updated }))
}

// ── DELETE /api/viewing-records/{id} ─────────────────────────────────────────

pub async fn delete_record(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, CrmError> {
    identity.require_role(&[UserRole::Admin])?;
    let usecase = DeleteRecordUseCase {
        records: state.record_repo(),
    };
    usecase.execute(id).await?;
    tracing::info!(record_id = %id, user_id = %identity.user_id, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}
