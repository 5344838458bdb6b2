use anyhow::Context as _;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;

use crm_auth_types::identity::Identity;

use crate::domain::policy::RecordScope;
use crate::error::CrmError;
use crate::handlers::viewing_records::RecordListQuery;
use crate::infra::xlsx::render_viewing_records;
use crate::state::AppState;
use crate::usecase::export::{ExportRecordsUseCase, export_filename};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// ── GET /api/export/viewing-records ──────────────────────────────────────────

pub async fn export_viewing_records(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<RecordListQuery>,
) -> Result<impl IntoResponse, CrmError> {
    let usecase = ExportRecordsUseCase {
        records: state.record_repo(),
    };
    let rows = usecase
        .execute(RecordScope::for_identity(&identity), query.filter()?)
        .await?;

    let generated_at = Utc::now();
    let bytes = tokio::task::spawn_blocking(move || render_viewing_records(&rows, generated_at))
        .await
        .context("join export task")?
        .context("render export workbook")?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(generated_at)
    );
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_owned()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
