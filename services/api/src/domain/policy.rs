//! Which viewing records a staff member may see and change.

use uuid::Uuid;

use crm_auth_types::identity::Identity;
use crm_domain::role::UserRole;

use crate::domain::types::{ViewingRecord, ViewingRecordFilter};
use crate::error::CrmError;

/// Admins see every record; agents only records assigned to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordScope {
    All,
    Agent(Uuid),
}

impl RecordScope {
    pub fn for_identity(identity: &Identity) -> Self {
        match identity.role {
            UserRole::Admin => Self::All,
            UserRole::Agent => Self::Agent(identity.user_id),
        }
    }

    /// The agent restriction to pass to repository queries.
    pub fn agent_id(self) -> Option<Uuid> {
        match self {
            Self::All => None,
            Self::Agent(id) => Some(id),
        }
    }

    /// Narrow a requested filter. Agents always get `agent_id = self`.
    pub fn restrict(self, mut filter: ViewingRecordFilter) -> ViewingRecordFilter {
        if let Self::Agent(id) = self {
            filter.agent_id = Some(id);
        }
        filter
    }

    pub fn can_access(self, record: &ViewingRecord) -> bool {
        match self {
            Self::All => true,
            Self::Agent(id) => record.agent_id == Some(id),
        }
    }

    pub fn ensure_access(self, record: &ViewingRecord) -> Result<(), CrmError> {
        if self.can_access(record) {
            Ok(())
        } else {
            Err(CrmError::Forbidden)
        }
    }

    /// Only admins may pick or change a record's agent.
    pub fn can_assign_agent(self) -> bool {
        matches!(self, Self::All)
    }
}
