//! Auth types shared by the CRM service and its tests.
//!
//! Provides JWT issuance/validation and the `Identity` bearer-token extractor.

pub mod identity;
pub mod token;
