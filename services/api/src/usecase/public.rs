//! Lead ingestion for authenticated channels. A channel only ever sees
//! records it created.

use chrono::Utc;
use uuid::Uuid;

use crm_domain::pagination::{Page, PageRequest};
use crm_domain::viewing::RecordSource;

use crate::domain::repository::{PropertyRepository, ViewingRecordRepository};
use crate::domain::types::{
    ChannelIdentity, ViewingRecord, ViewingRecordDraft, ViewingRecordFilter, ViewingRecordPatch,
};
use crate::error::CrmError;
use crate::usecase::properties::ensure_property_exists;

async fn find_owned<R: ViewingRecordRepository>(
    records: &R,
    channel: &ChannelIdentity,
    id: Uuid,
) -> Result<ViewingRecord, CrmError> {
    match records.find_by_id(id).await? {
        Some(record) if record.api_key_id == Some(channel.id) => Ok(record),
        _ => Err(CrmError::RecordNotFound),
    }
}

// ── CreateChannelRecord ──────────────────────────────────────────────────────

pub struct CreateChannelRecordUseCase<R, P>
where
    R: ViewingRecordRepository,
    P: PropertyRepository,
{
    pub records: R,
    pub properties: P,
}

impl<R, P> CreateChannelRecordUseCase<R, P>
where
    R: ViewingRecordRepository,
    P: PropertyRepository,
{
    pub async fn execute(
        &self,
        channel: &ChannelIdentity,
        draft: ViewingRecordDraft,
    ) -> Result<ViewingRecord, CrmError> {
        let draft = draft.validated()?;
        ensure_property_exists(&self.properties, draft.property_id).await?;

        let record = draft.into_record(RecordSource::Api, None, Some(channel.id), Utc::now());
        self.records.create(&record).await?;
        tracing::info!(record_id = %record.id, channel = %channel.channel_name, "lead ingested");
        find_owned(&self.records, channel, record.id).await
    }
}

// ── ListChannelRecords ───────────────────────────────────────────────────────

pub struct ListChannelRecordsUseCase<R: ViewingRecordRepository> {
    pub records: R,
}

impl<R: ViewingRecordRepository> ListChannelRecordsUseCase<R> {
    pub async fn execute(
        &self,
        channel: &ChannelIdentity,
        filter: ViewingRecordFilter,
        page: PageRequest,
    ) -> Result<Page<ViewingRecord>, CrmError> {
        let page = page.clamped();
        let filter = ViewingRecordFilter {
            api_key_id: Some(channel.id),
            ..filter
        };
        let (items, total) = self.records.list(&filter, page).await?;
        Ok(Page::new(items, total, page))
    }
}

// ── GetChannelRecord ─────────────────────────────────────────────────────────

pub struct GetChannelRecordUseCase<R: ViewingRecordRepository> {
    pub records: R,
}

impl<R: ViewingRecordRepository> GetChannelRecordUseCase<R> {
    pub async fn execute(
        &self,
        channel: &ChannelIdentity,
        id: Uuid,
    ) -> Result<ViewingRecord, CrmError> {
        find_owned(&self.records, channel, id).await
    }
}

// ── UpdateChannelRecord ──────────────────────────────────────────────────────

pub struct UpdateChannelRecordUseCase<R: ViewingRecordRepository> {
    pub records: R,
}

impl<R: ViewingRecordRepository> UpdateChannelRecordUseCase<R> {
    /// Channels may edit lead details and status, never the assigned agent
    /// or property.
    pub async fn execute(
        &self,
        channel: &ChannelIdentity,
        id: Uuid,
        patch: ViewingRecordPatch,
    ) -> Result<ViewingRecord, CrmError> {
        let patch = ViewingRecordPatch {
            agent_id: None,
            property_id: None,
            ..patch
        }
        .validated()?;
        if patch.is_empty() {
            return Err(CrmError::validation("no fields to update"));
        }
        find_owned(&self.records, channel, id).await?;
        self.records.update(id, &patch).await?;
        find_owned(&self.records, channel, id).await
    }
}
