use chrono::{DateTime, Datelike};

/// `m:ss` for a clip length in seconds.
pub fn format_duration(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 { secs.floor() as u64 } else { 0 };
    format!("{}:{:02}", total / 60, total % 60)
}

/// `YYYY. MM. DD` for an asset creation time in milliseconds, empty when the
/// gallery did not report one.
pub fn format_asset_date(created_at_ms: Option<i64>) -> String {
    created_at_ms
        .filter(|ms| *ms > 0)
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| format!("{}. {:02}. {:02}", dt.year(), dt.month(), dt.day()))
        .unwrap_or_default()
}
