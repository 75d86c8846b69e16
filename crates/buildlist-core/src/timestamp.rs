//! UTC timestamps in the `YYYY-MM-DD HH:MM:SS` form used by build lists.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{BuildListError, Result};

/// `strftime` pattern of a build list timestamp line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current time as whole seconds since the epoch.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Format seconds since the epoch.
///
/// Values outside chrono's range fall back to the epoch itself.
pub fn format(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .unwrap_or_default()
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Parse a timestamp line back to seconds since the epoch.
///
/// # Errors
///
/// Returns [`BuildListError::BadTimestamp`] if `s` is not in
/// [`TIMESTAMP_FORMAT`].
pub fn parse(s: &str) -> Result<i64> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|source| BuildListError::BadTimestamp {
            value: s.to_string(),
            source,
        })
}
