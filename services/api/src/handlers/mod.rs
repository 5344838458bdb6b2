pub mod api_keys;
pub mod auth;
pub mod export;
pub mod properties;
pub mod public;
pub mod roles;
pub mod users;
pub mod viewing_records;

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::CrmError;

/// Parse an optional query value; blank counts as absent.
pub(crate) fn parse_query<T>(field: &str, raw: Option<&str>) -> Result<Option<T>, CrmError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| CrmError::validation(format!("{field}: {e}"))),
    }
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD`. A bare date as an upper bound
/// covers the whole day.
pub(crate) fn parse_date_bound(
    field: &str,
    raw: Option<&str>,
    end_of_day: bool,
) -> Result<Option<DateTime<Utc>>, CrmError> {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CrmError::validation(format!("{field}: expected a date")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    };
    Ok(time.map(|t| date.and_time(t).and_utc()))
}

/// Optional text edit: absent leaves the column alone, blank clears it.
pub(crate) fn patch_text(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}
