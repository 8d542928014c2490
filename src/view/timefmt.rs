//! Timestamp parsing and human-relative formatting.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Shown whenever a timestamp cannot be parsed.
pub const INVALID_TIME: &str = "invalid time";

/// Parse a backend timestamp, treating zone-less values as UTC.
///
/// The backend serializes `datetime.isoformat()` with no zone marker
/// (e.g. `2026-08-06T10:15:00.123456`); RFC 3339 values with `Z` or an
/// offset are accepted too.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // Zone-less ISO form, 'T' or space separated.
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    None
}

/// Format the elapsed time between `raw` and `now` as a label:
/// "just now", "{n} mins ago", "{n} hours ago", or a calendar date once a
/// day has passed. Unparseable input yields [`INVALID_TIME`].
///
/// Whole minutes are floored (90 s is still "1 min ago"); hours are rounded
/// (60 min is "1 hour ago", 90 min is "2 hours ago").
pub fn relative_from(raw: &str, now: DateTime<Utc>) -> String {
    let Some(ts) = parse_utc(raw) else {
        return INVALID_TIME.to_string();
    };

    let mins = (now - ts).num_minutes();
    if mins <= 0 {
        return "just now".to_string();
    }
    if mins == 1 {
        return "1 min ago".to_string();
    }
    if mins < 60 {
        return format!("{} mins ago", mins);
    }

    let hours = (mins + 30) / 60;
    if hours < 2 {
        return "1 hour ago".to_string();
    }
    if hours < 24 {
        return format!("{} hours ago", hours);
    }

    // Day + abbreviated month, English locale.
    ts.format("%-d %b").to_string()
}
