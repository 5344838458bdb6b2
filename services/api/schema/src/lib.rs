//! sea-orm entities for the CRM database.

pub mod api_keys;
pub mod properties;
pub mod roles;
pub mod users;
pub mod viewing_records;
