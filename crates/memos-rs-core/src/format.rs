//! Display helpers shared by the history panels.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde_json::Value;

/// Length at which [`short_json`] cuts its output.
pub const SHORT_JSON_MAX: usize = 240;

/// Compact JSON cut at `max_len` characters with a trailing `…`.
pub fn short_json(value: &Value, max_len: usize) -> String {
    let text = value.to_string();
    if text.chars().count() > max_len {
        let mut cut: String = text.chars().take(max_len).collect();
        cut.push('…');
        cut
    } else {
        text
    }
}

/// Parse an ISO-8601 timestamp. Offset-less values are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Local-time rendering of an ISO timestamp, or the raw string when it
/// does not parse.
pub fn format_timestamp(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(ts) => ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => raw.to_string(),
    }
}

/// `14052` -> `14,052`.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn short_json_cuts_long_payloads() {
        assert_eq!(short_json(&json!({"a": 1}), SHORT_JSON_MAX), r#"{"a":1}"#);
        let long = json!({"text": "x".repeat(500)});
        let cut = short_json(&long, SHORT_JSON_MAX);
        assert_eq!(cut.chars().count(), SHORT_JSON_MAX + 1);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn timestamps_fall_back_to_raw() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert!(parse_timestamp("2024-01-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2024-01-01T10:00:00.123456").is_some());
        assert!(parse_timestamp("2024-01-01T10:00:00+02:00").is_some());
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(14052), "14,052");
        assert_eq!(format_thousands(845200), "845,200");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }
}
