//! Input and parsing helper functions for the CLI.

use std::io::{self, IsTerminal, Read};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use dialoguer::Input;
use uuid::Uuid;

use notevault_core::session::MAX_SESSION_TIMEOUT_MINUTES;
use notevault_core::Vault;

use crate::errors::CliError;

/// Shortest id prefix accepted in place of a full UUID.
const MIN_ID_PREFIX: usize = 4;

/// Read a note body from --body, piped stdin, or an interactive prompt.
pub fn read_note_body(body: Option<String>) -> anyhow::Result<String> {
    if let Some(value) = body {
        return Ok(value);
    }

    if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
        return Ok(buffer.trim_end().to_string());
    }

    Input::<String>::new()
        .with_prompt("Body")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to read body: {}", e))
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_datetime(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| CliError::invalid_input(format!("Invalid date value: {}", value)))?;
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    Err(CliError::invalid_input(format!(
        "Invalid date/time (expected RFC 3339 or YYYY-MM-DD): {}",
        value
    ))
    .into())
}

/// Parse a duration string (e.g., "7d", "24h").
pub fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    let invalid = |detail: &str| -> anyhow::Error {
        CliError::invalid_input(format!("Invalid duration '{}': {}", value, detail)).into()
    };
    if value.len() < 2 || !value.is_ascii() {
        return Err(invalid("expected <number><unit>"));
    }

    let (num_str, unit) = value.split_at(value.len() - 1);
    let amount: i64 = num_str.parse().map_err(|_| invalid("not a number"))?;
    if amount <= 0 {
        return Err(invalid("must be positive"));
    }

    let duration = match unit {
        "d" => Duration::try_days(amount),
        "h" => Duration::try_hours(amount),
        "m" => Duration::try_minutes(amount),
        "s" => Duration::try_seconds(amount),
        _ => return Err(invalid("use d/h/m/s")),
    };
    duration.ok_or_else(|| invalid("too large"))
}

/// Check a session timeout given in minutes; `source` names the setting.
pub fn check_timeout_minutes(minutes: i64, source: &str) -> anyhow::Result<i64> {
    if !(1..=MAX_SESSION_TIMEOUT_MINUTES).contains(&minutes) {
        return Err(CliError::invalid_input(format!(
            "{} must be between 1 and {} minutes, got {}",
            source, MAX_SESSION_TIMEOUT_MINUTES, minutes
        ))
        .into());
    }
    Ok(minutes)
}

/// Pick the single id starting with `prefix`.
fn match_id_prefix(ids: impl IntoIterator<Item = Uuid>, prefix: &str) -> anyhow::Result<Uuid> {
    let needle = prefix.trim().to_ascii_lowercase();
    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [] => Err(CliError::not_found(
            format!("No note with id {}", prefix),
            "Hint: run `notevault list` to see note ids.",
        )
        .into()),
        [id] => Ok(*id),
        _ => Err(CliError::invalid_input(format!(
            "Id prefix '{}' matches {} notes; use more characters",
            prefix,
            matches.len()
        ))
        .into()),
    }
}

/// Resolve a full id or a unique id prefix to a note id.
pub fn resolve_note_id(vault: &Vault, raw: &str) -> anyhow::Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(id);
    }
    let trimmed = raw.trim();
    if trimmed.len() < MIN_ID_PREFIX
        || !trimmed.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
    {
        return Err(CliError::invalid_input(format!("Invalid note id: {}", raw)).into());
    }
    let ids = vault.list_notes()?.into_iter().map(|note| note.id);
    match_id_prefix(ids, trimmed)
}

/// Split an interactive command line into words, honouring double quotes.
pub fn split_words(line: &str) -> anyhow::Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_word = false;

    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_word = true;
            }
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_word {
                    words.push(std::mem::take(&mut current));
                    has_word = false;
                }
            }
            c => {
                current.push(c);
                has_word = true;
            }
        }
    }

    if in_quotes {
        return Err(CliError::invalid_input("Unterminated quote").into());
    }
    if has_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_datetime_accepts_date() {
        let parsed = parse_datetime("2026-03-04").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_datetime_converts_offset() {
        let parsed = parse_datetime("2026-03-04T10:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 4, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert!(parse_duration("0d").is_err());
        assert!(parse_duration("3w").is_err());
        assert!(parse_duration("d").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_out_of_range() {
        let err = parse_duration("99999999999999999d").unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(parse_duration("9223372036854775807s").is_err());
    }

    #[test]
    fn test_check_timeout_minutes_bounds() {
        assert_eq!(check_timeout_minutes(30, "--timeout").unwrap(), 30);
        assert_eq!(
            check_timeout_minutes(MAX_SESSION_TIMEOUT_MINUTES, "--timeout").unwrap(),
            MAX_SESSION_TIMEOUT_MINUTES
        );
        assert!(check_timeout_minutes(0, "--timeout").is_err());
        let err = check_timeout_minutes(99_999_999_999, "session.timeout_minutes").unwrap_err();
        assert!(err.to_string().contains("session.timeout_minutes"));
    }

    #[test]
    fn test_match_id_prefix() {
        let a = Uuid::parse_str("aaaa1111-0000-4000-8000-000000000000").unwrap();
        let b = Uuid::parse_str("aaaa2222-0000-4000-8000-000000000000").unwrap();

        assert_eq!(match_id_prefix([a, b], "AAAA1").unwrap(), a);
        assert!(match_id_prefix([a, b], "aaaa").is_err());
        assert!(match_id_prefix([a, b], "bbbb").is_err());
    }

    #[test]
    fn test_split_words_with_quotes() {
        let words = split_words(r#"add "Shopping list" "milk, \"oat\" eggs""#).unwrap();
        assert_eq!(words, vec!["add", "Shopping list", r#"milk, "oat" eggs"#]);
    }

    #[test]
    fn test_split_words_keeps_empty_quoted_word() {
        assert_eq!(split_words(r#"edit abcd "" "#).unwrap(), vec!["edit", "abcd", ""]);
        assert!(split_words(r#"add "open"#).is_err());
        assert!(split_words("   ").unwrap().is_empty());
    }
}
