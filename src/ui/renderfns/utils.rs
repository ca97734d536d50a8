use chrono::DateTime;

/// Truncate a string to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Render a backend timestamp as `YYYY-MM-DD HH:MM`, or as-is if it does not
/// parse.
pub fn format_timestamp(raw: &str) -> String {
  DateTime::parse_from_rfc3339(raw)
    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
    .unwrap_or_else(|_| raw.to_string())
}
