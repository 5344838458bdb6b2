use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crm_domain::pagination::Page;

use crate::domain::types::ChannelIdentity;
use crate::error::CrmError;
use crate::handlers::viewing_records::{
    RecordDraftBody, RecordListQuery, UpdateRecordRequest, ViewingRecordResponse,
};
use crate::state::AppState;
use crate::usecase::public::{
    CreateChannelRecordUseCase, GetChannelRecordUseCase, ListChannelRecordsUseCase,
    UpdateChannelRecordUseCase,
};

// Every route here sits behind `require_api_key`, which supplies the channel.

// ── POST /api/public/viewing-records ─────────────────────────────────────────

pub async fn create_record(
    Extension(channel): Extension<ChannelIdentity>,
    State(state): State<AppState>,
    Json(body): Json<RecordDraftBody>,
) -> Result<(StatusCode, Json<ViewingRecordResponse>), CrmError> {
    let usecase = CreateChannelRecordUseCase {
        records: state.record_repo(),
        properties: state.property_repo(),
    };
    let record = usecase.execute(&channel, body.into()).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

// ── GET /api/public/viewing-records ──────────────────────────────────────────

pub async fn list_records(
    Extension(channel): Extension<ChannelIdentity>,
    State(state): State<AppState>,
    Query(query): Query<RecordListQuery>,
) -> Result<Json<Page<ViewingRecordResponse>>, CrmError> {
    let usecase = ListChannelRecordsUseCase {
        records: state.record_repo(),
    };
    let page = usecase
        .execute(&channel, query.filter()?, query.page_request())
        .await?;
    Ok(Json(page.map(ViewingRecordResponse::from)))
}

// ── GET /api/public/viewing-records/{id} ─────────────────────────────────────

pub async fn get_record(
    Extension(channel): Extension<ChannelIdentity>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ViewingRecordResponse>, CrmError> {
    let usecase = GetChannelRecordUseCase {
        records: state.record_repo(),
    };
    Ok(Json(usecase.execute(&channel, id).await?.into()))
}

// ── PATCH /api/public/viewing-records/{id} ───────────────────────────────────

pub async fn update_record(
    Extension(channel): Extension<ChannelIdentity>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRecordRequest>,
) -> Result<Json<ViewingRecordResponse>, CrmError> {
    let usecase = UpdateChannelRecordUseCase {
        records: state.record_repo(),
    };
    let record = usecase.execute(&channel, id, body.into()).await?;
    Ok(Json(record.into()))
}
