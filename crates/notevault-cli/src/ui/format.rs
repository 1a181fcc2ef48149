//! String formatting utilities for UI rendering.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Truncate a string to max length, adding ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let truncated: String = s.chars().take(max_len - 3).collect();
    format!("{}...", truncated)
}

/// First line of a body, for previews.
pub fn first_line(body: &str) -> &str {
    body.lines().next().unwrap_or("")
}

/// Format a short ID from a UUID (first 8 characters).
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Format a datetime for display.
pub fn format_datetime(dt: &DateTime<Utc>, pretty: bool) -> String {
    if pretty {
        dt.format("%Y-%m-%d %H:%M UTC").to_string()
    } else {
        dt.to_rfc3339()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 8), "a lon...");
        assert_eq!(truncate("日本語のメモ", 5), "日本...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("Milk\nEggs"), "Milk");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn test_short_id() {
        let id = Uuid::parse_str("1234abcd-0000-4000-8000-000000000000").unwrap();
        assert_eq!(short_id(&id), "1234abcd");
    }

    #[test]
    fn test_format_datetime() {
        let dt = Utc.with_ymd_and_hms(2026, 6, 1, 8, 5, 0).unwrap();
        assert_eq!(format_datetime(&dt, true), "2026-06-01 08:05 UTC");
        assert_eq!(format_datetime(&dt, false), "2026-06-01T08:05:00+00:00");
    }
}
