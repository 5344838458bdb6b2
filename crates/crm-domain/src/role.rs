//! Staff role types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Staff permission level.
///
/// Wire format: lowercase name (`"admin"`, `"agent"`), matching `roles.name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Unrestricted staff role.
    Admin,
    /// Staff role scoped to the records they own.
    Agent,
}

/// Returned when a role name does not match any known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl UserRole {
    pub const ALL: [Self; 2] = [Self::Admin, Self::Agent];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Agent => "agent",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "agent" => Ok(Self::Agent),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}
