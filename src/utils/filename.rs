use chrono::{DateTime, Local};

/// Placeholder tokens recognized in backup filename patterns.
const TOKEN_DATABASE: &str = "{$DATABASE}";
const TOKEN_DATETIME: &str = "{$DATETIME}";
const TOKEN_HOSTNAME: &str = "{$HOSTNAME}";
const TOKEN_TIMESTAMP: &str = "{$TIMESTAMP}";

/// Expands the substitution tokens in a filename pattern.
///
/// `{$DATABASE}` becomes the database name, `{$DATETIME}` the 14-digit
/// local timestamp (`YYYYMMDDHHMMSS`), `{$HOSTNAME}` the normalized
/// connection host and `{$TIMESTAMP}` the unix epoch seconds. Expansion
/// happens exactly once, before any extension validation.
pub fn expand_pattern(pattern: &str, database: &str, host: &str, now: DateTime<Local>) -> String {
    pattern
        .replace(TOKEN_DATABASE, database)
        .replace(TOKEN_DATETIME, &now.format("%Y%m%d%H%M%S").to_string())
        .replace(TOKEN_HOSTNAME, &normalize_host(host))
        .replace(TOKEN_TIMESTAMP, &now.timestamp().to_string())
}

/// Loopback addresses read better as `localhost` in filenames.
pub fn normalize_host(host: &str) -> String {
    match host {
        "127.0.0.1" | "::1" => "localhost".to_string(),
        other => other.to_string(),
    }
}
