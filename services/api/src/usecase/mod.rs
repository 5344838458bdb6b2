pub mod api_keys;
pub mod auth;
pub mod channel_auth;
pub mod export;
pub mod password;
pub mod properties;
pub mod public;
pub mod rate_limit;
pub mod roles;
pub mod users;
pub mod viewing_records;
