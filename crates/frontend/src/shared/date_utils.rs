/// Utilities for date and time formatting
///
/// Record timestamps arrive as ISO-8601 strings; tables render them in
/// a compact local-agnostic form.

/// Format ISO datetime string to "YYYY-MM-DD HH:MM:SS".
/// Example: "2024-03-15T14:02:26.123Z" -> "2024-03-15 14:02:26"
pub fn format_datetime(datetime_str: &str) -> String {
    if let Some((date_part, time_part)) = datetime_str.split_once('T') {
        let time = time_part.split('.').next().unwrap_or(time_part);
        let time = time.trim_end_matches('Z');
        return format!("{} {}", date_part, time);
    }
    datetime_str.to_string()
}
