//! Environment-variable helpers for service configuration.

use std::str::FromStr;

use anyhow::{Context as _, anyhow};

/// Read a required env var. Empty values count as missing.
pub fn required(key: &str) -> anyhow::Result<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(anyhow!("missing required env var {key}")),
    }
}

/// Read an optional env var, returning `None` when unset or empty.
pub fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse an env var, falling back to `default` when unset.
/// A set-but-unparsable value is an error rather than a silent default.
pub fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for env var {key}: {raw:?}")),
        None => Ok(default),
    }
}
