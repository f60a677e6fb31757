//! Date coercion.
//!
//! Unlike format coercion this raises an error: a malformed date here points
//! at a programming or data error, not at routine untrusted input.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::Error;

/// Naive layouts tried in order before the zoned forms.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a date or timestamp string.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD`
/// (midnight), RFC 3339 and RFC 2822. Zoned forms are converted to UTC.
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`Error::DateParse`] if no layout matches.
///
/// # Examples
///
/// ```
/// use safely::safe_str_to_time;
///
/// let t = safe_str_to_time("2024-02-29 13:45:00").unwrap();
/// assert_eq!(t.to_string(), "2024-02-29 13:45:00");
///
/// let utc = safe_str_to_time("2024-02-29T13:45:00+02:00").unwrap();
/// assert_eq!(utc.to_string(), "2024-02-29 11:45:00");
///
/// assert!(safe_str_to_time("next tuesday-ish").is_err());
/// ```
pub fn safe_str_to_time(input: &str) -> Result<NaiveDateTime, Error> {
    let s = input.trim();

    for layout in NAIVE_DATETIME_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, layout) {
            return Ok(t);
        }
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.naive_utc());
    }
    if let Ok(t) = DateTime::parse_from_rfc2822(s) {
        return Ok(t.naive_utc());
    }
    if let Some(t) = NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(t);
    }

    tracing::debug!("date string did not match any accepted layout");
    Err(Error::DateParse {
        input: input.to_string(),
    })
}
