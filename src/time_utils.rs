// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Date-only layouts accepted besides RFC3339 / RFC2822.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%b %d %Y"];

/// Read a JSON timestamp as epoch milliseconds.
///
/// Accepts milliseconds (what `Date.now()` produces, fractions rounded), a
/// numeric string, RFC3339, RFC2822, or a date-only string read as UTC
/// midnight. A leading weekday name on a date-only string is ignored, even
/// if it does not match the date. Anything else yields `None`.
pub fn timestamp_millis(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        serde_json::Value::String(s) => parse_date_millis(s.trim()),
        _ => None,
    }
}

fn parse_date_millis(s: &str) -> Option<i64> {
    if let Ok(millis) = s.parse::<i64>() {
        return Some(millis);
    }
    let full = DateTime::parse_from_rfc3339(s).or_else(|_| DateTime::parse_from_rfc2822(s));
    if let Ok(date) = full {
        return Some(date.timestamp_millis());
    }

    // "Sat Mar 01 2024" -> "Mar 01 2024"
    let without_weekday = s.split_once(' ').map(|(_, rest)| rest);
    [Some(s), without_weekday]
        .into_iter()
        .flatten()
        .find_map(|candidate| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(candidate, format).ok())
        })
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_format_utc_rfc3339() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2024-03-01T12:30:00Z");
    }

    #[test]
    fn test_timestamp_millis() {
        assert_eq!(timestamp_millis(&json!(1700000000000_i64)), Some(1700000000000));
        assert_eq!(
            timestamp_millis(&json!("2024-03-01T12:30:00Z")),
            Some(1709296200000)
        );
        assert_eq!(timestamp_millis(&json!(1700000000000.6)), Some(1700000000001));
        assert_eq!(timestamp_millis(&json!("1700000000000")), Some(1700000000000));
        assert_eq!(
            timestamp_millis(&json!("Fri, 01 Mar 2024 12:30:00 +0000")),
            Some(1709296200000)
        );
        assert_eq!(timestamp_millis(&json!("2024-03-01")), Some(1709251200000));
        assert_eq!(timestamp_millis(&json!("Sat Mar 01 2024")), Some(1709251200000));
        assert_eq!(timestamp_millis(&json!("yesterday")), None);
        assert_eq!(timestamp_millis(&json!(null)), None);
    }
}
