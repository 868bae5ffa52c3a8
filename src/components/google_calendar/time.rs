use crate::error::{AppResult, Error};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Parse a subscription's renewal date
///
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates, the latter
/// at midnight UTC.
pub fn parse_renewal_date(raw: &str) -> AppResult<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| Error::InvalidDate(raw.to_string()))
}

/// RFC 3339 rendering of `instant` in `timezone`
pub fn format_in_timezone(instant: DateTime<Utc>, timezone: Tz) -> String {
    instant.with_timezone(&timezone).to_rfc3339()
}
