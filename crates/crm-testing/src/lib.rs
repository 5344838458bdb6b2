//! Test utilities for the CRM crates.
//!
//! Provides `MockAuth`, which mints real bearer tokens for a chosen identity.
//! For dev-dependencies only.

pub mod auth;
