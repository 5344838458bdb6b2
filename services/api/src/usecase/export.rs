use chrono::{DateTime, Utc};

use crate::domain::policy::RecordScope;
use crate::domain::repository::ViewingRecordRepository;
use crate::domain::types::{EXPORT_MAX_ROWS, ViewingRecord, ViewingRecordFilter};
use crate::error::CrmError;

/// Download name, e.g. `viewing-records-20261018093000.xlsx`.
pub fn export_filename(at: DateTime<Utc>) -> String {
    format!("viewing-records-{}.xlsx", at.format("%Y%m%d%H%M%S"))
}

pub struct ExportRecordsUseCase<R: ViewingRecordRepository> {
    pub records: R,
}

impl<R: ViewingRecordRepository> ExportRecordsUseCase<R> {
    /// Rows for the spreadsheet, newest first, capped at [`EXPORT_MAX_ROWS`].
    pub async fn execute(
        &self,
        scope: RecordScope,
        filter: ViewingRecordFilter,
    ) -> Result<Vec<ViewingRecord>, CrmError> {
        let filter = scope.restrict(filter);
        let rows = self.records.list_all(&filter, EXPORT_MAX_ROWS).await?;
        tracing::info!(rows = rows.len(), "viewing records exported");
        Ok(rows)
    }
}
