//! Domain types shared across the viewing-record CRM crates.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; persistence mapping lives in `infra/`.

pub mod pagination;
pub mod role;
pub mod viewing;
