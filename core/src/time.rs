//! Time related utils.

use crate::{Error, Result};
use chrono::{SecondsFormat, TimeZone, Utc};

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Convert whole seconds since the unix epoch into a UTC datetime.
pub fn from_timestamp(secs: i64) -> Result<DateTime> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| Error::request_invalid(format!("timestamp {secs} is out of range")))
}

/// Convert milliseconds since the unix epoch into a UTC datetime with
/// seconds precision.
///
/// Milliseconds are floor-divided by 1000, so `999` becomes `0`.
pub fn from_timestamp_millis_floor(millis: i64) -> Result<DateTime> {
    from_timestamp(millis.div_euclid(1000))
}

/// Format time into RFC3339 with seconds precision: `2023-11-14T22:13:20Z`
pub fn format_rfc3339(t: DateTime) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}
