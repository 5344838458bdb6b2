//! Shared HTTP plumbing for the viewing-record CRM services.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
