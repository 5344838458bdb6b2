//! Viewing record enums.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returned when a stored or submitted enum value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field}: {value}")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

/// Appointment lifecycle of a viewing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl ViewingStatus {
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable label used in exported spreadsheets.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for ViewingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                field: "viewing status",
                value: s.to_owned(),
            })
    }
}

/// Rental product the tenant is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    #[default]
    WholeRent,
    SharedRent,
    Centralized,
}

impl BusinessType {
    pub const ALL: [Self; 3] = [Self::WholeRent, Self::SharedRent, Self::Centralized];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WholeRent => "whole_rent",
            Self::SharedRent => "shared_rent",
            Self::Centralized => "centralized",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::WholeRent => "Whole rent",
            Self::SharedRent => "Shared rent",
            Self::Centralized => "Centralized",
        }
    }
}

impl FromStr for BusinessType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                field: "business type",
                value: s.to_owned(),
            })
    }
}

/// Provenance tag on a viewing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    #[default]
    Manual,
    Api,
    ThirdParty,
}

impl RecordSource {
    pub const ALL: [Self; 3] = [Self::Manual, Self::Api, Self::ThirdParty];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Api => "api",
            Self::ThirdParty => "third_party",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Api => "API",
            Self::ThirdParty => "Third party",
        }
    }
}

impl FromStr for RecordSource {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                field: "source",
                value: s.to_owned(),
            })
    }
}
