use chrono::Utc;
use uuid::Uuid;

use crm_domain::pagination::{Page, PageRequest};
use crm_domain::viewing::{RecordSource, ViewingStatus};

use crate::domain::policy::RecordScope;
use crate::domain::repository::{PropertyRepository, UserRepository, ViewingRecordRepository};
use crate::domain::types::{
    StatusCounts, ViewingRecord, ViewingRecordDraft, ViewingRecordFilter, ViewingRecordPatch,
    blank_to_none, distinct_ids,
};
use crate::error::CrmError;
use crate::usecase::properties::ensure_property_exists;

/// An assignee must be an existing, active staff account.
async fn ensure_assignable<U: UserRepository>(users: &U, agent_id: Uuid) -> Result<(), CrmError> {
    match users.find_by_id(agent_id).await? {
        Some(user) if user.is_active => Ok(()),
        _ => Err(CrmError::InvalidAgent),
    }
}

async fn reload<R: ViewingRecordRepository>(
    records: &R,
    id: Uuid,
) -> Result<ViewingRecord, CrmError> {
    records
        .find_by_id(id)
        .await?
        .ok_or(CrmError::RecordNotFound)
}

// ── ListRecords ──────────────────────────────────────────────────────────────

pub struct ListRecordsUseCase<R: ViewingRecordRepository> {
    pub records: R,
}

impl<R: ViewingRecordRepository> ListRecordsUseCase<R> {
    pub async fn execute(
        &self,
        scope: RecordScope,
        filter: ViewingRecordFilter,
        page: PageRequest,
    ) -> Result<Page<ViewingRecord>, CrmError> {
        let page = page.clamped();
        let filter = scope.restrict(filter);
        let (items, total) = self.records.list(&filter, page).await?;
        Ok(Page::new(items, total, page))
    }
}

// ── RecordStatistics ─────────────────────────────────────────────────────────

pub struct RecordStatisticsUseCase<R: ViewingRecordRepository> {
    pub records: R,
}

impl<R: ViewingRecordRepository> RecordStatisticsUseCase<R> {
    pub async fn execute(
        &self,
        scope: RecordScope,
        filter: ViewingRecordFilter,
    ) -> Result<StatusCounts, CrmError> {
        self.records.count_by_status(&scope.restrict(filter)).await
    }
}

// ── GetRecord ────────────────────────────────────────────────────────────────

pub struct GetRecordUseCase<R: ViewingRecordRepository> {
    pub records: R,
}

impl<R: ViewingRecordRepository> GetRecordUseCase<R> {
    pub async fn execute(&self, scope: RecordScope, id: Uuid) -> Result<ViewingRecord, CrmError> {
        let record = reload(&self.records, id).await?;
        scope.ensure_access(&record)?;
        Ok(record)
    }
}

// ── CreateRecord ─────────────────────────────────────────────────────────────

pub struct CreateRecordInput {
    pub draft: ViewingRecordDraft,
    /// Honoured for admins only; agents always own what they create.
    pub agent_id: Option<Uuid>,
}

pub struct CreateRecordUseCase<R, U, P>
where
    R: ViewingRecordRepository,
    U: UserRepository,
    P: PropertyRepository,
{
    pub records: R,
    pub users: U,
    pub properties: P,
}

impl<R, U, P> CreateRecordUseCase<R, U, P>
where
    R: ViewingRecordRepository,
    U: UserRepository,
    P: PropertyRepository,
{
    pub async fn execute(
        &self,
        scope: RecordScope,
        input: CreateRecordInput,
    ) -> Result<ViewingRecord, CrmError> {
        let draft = input.draft.validated()?;
        ensure_property_exists(&self.properties, draft.property_id).await?;

        let agent_id = match scope {
            RecordScope::Agent(me) => Some(me),
            RecordScope::All => {
                if let Some(agent_id) = input.agent_id {
                    ensure_assignable(&self.users, agent_id).await?;
                }
                input.agent_id
            }
        };

        let record = draft.into_record(RecordSource::Manual, agent_id, None, Utc::now());
        self.records.create(&record).await?;
        reload(&self.records, record.id).await
    }
}

// ── UpdateRecord ─────────────────────────────────────────────────────────────

pub struct UpdateRecordUseCase<R, U, P>
where
    R: ViewingRecordRepository,
    U: UserRepository,
    P: PropertyRepository,
{
    pub records: R,
    pub users: U,
    pub properties: P,
}

impl<R, U, P> UpdateRecordUseCase<R, U, P>
where
    R: ViewingRecordRepository,
    U: UserRepository,
    P: PropertyRepository,
{
    pub async fn execute(
        &self,
        scope: RecordScope,
        id: Uuid,
        patch: ViewingRecordPatch,
    ) -> Result<ViewingRecord, CrmError> {
        let patch = patch.validated()?;
        if patch.is_empty() {
            return Err(CrmError::validation("no fields to update"));
        }

        let existing = reload(&self.records, id).await?;
        scope.ensure_access(&existing)?;

        if let Some(agent_id) = patch.agent_id {
            if existing.agent_id != agent_id {
                if !scope.can_assign_agent() {
                    return Err(CrmError::Forbidden);
                }
                if let Some(agent_id) = agent_id {
                    ensure_assignable(&self.users, agent_id).await?;
                }
            }
        }
        if let Some(property_id) = patch.property_id {
            ensure_property_exists(&self.properties, property_id).await?;
        }

        self.records.update(id, &patch).await?;
        reload(&self.records, id).await
    }
}

// ── UpdateRecordStatus ───────────────────────────────────────────────────────

pub struct UpdateRecordStatusUseCase<R: ViewingRecordRepository> {
    pub records: R,
}

impl<R: ViewingRecordRepository> UpdateRecordStatusUseCase<R> {
    pub async fn execute(
        &self,
        scope: RecordScope,
        id: Uuid,
        status: ViewingStatus,
        feedback: Option<String>,
    ) -> Result<ViewingRecord, CrmError> {
        let existing = reload(&self.records, id).await?;
        scope.ensure_access(&existing)?;

        let patch = ViewingRecordPatch {
            viewing_status: Some(status),
            viewing_feedback: feedback.map(|f| blank_to_none(Some(f))),
            ..Default::default()
        };
        self.records.update(id, &patch).await?;
        reload(&self.records, id).await
    }
}

// ── BatchUpdateStatus ────────────────────────────────────────────────────────

pub struct BatchUpdateStatusUseCase<R: ViewingRecordRepository> {
    pub records: R,
}

impl<R: ViewingRecordRepository> BatchUpdateStatusUseCase<R> {
    /// All-or-nothing: any missing or inaccessible id fails the whole batch.
    pub async fn execute(
        &self,
        scope: RecordScope,
        ids: &[Uuid],
        status: ViewingStatus,
    ) -> Result<u64, CrmError> {
        let ids = distinct_ids(ids)?;
        match self
            .records
            .batch_update_status(&ids, scope.agent_id(), status)
            .await?
        {
            Some(updated) => {
                tracing::info!(count = updated, status = status.as_str(), "records batch updated");
                Ok(updated)
            }
            None => Err(CrmError::Forbidden),
        }
    }
}

// ── DeleteRecord ─────────────────────────────────────────────────────────────

pub struct DeleteRecordUseCase<R: ViewingRecordRepository> {
    pub records: R,
}

impl<R: ViewingRecordRepository> DeleteRecordUseCase<R> {
    pub async fn execute(&self, id: Uuid) -> Result<(), CrmError> {
        if !self.records.delete(id).await? {
            return Err(CrmError::RecordNotFound);
        }
        Ok(())
    }
}
