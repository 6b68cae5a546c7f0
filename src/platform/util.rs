use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use percent_encoding::percent_decode_str;
use regex::Regex;

use super::PlatformError;

static HASHTAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\w+")
        .context("Failed to create hashtag regex")
        .unwrap()
});

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Shortens counters: 999 -> "999", 1500 -> "1.5K", 2000000 -> "2M".
pub fn format_number(num: u64) -> String {
    fn scaled(value: f64, suffix: &str) -> String {
        if value.fract() == 0.0 {
            format!("{:.0}{}", value, suffix)
        } else {
            format!("{:.1}{}", value, suffix)
        }
    }

    if num >= 1_000_000 {
        scaled(num as f64 / 1_000_000.0, "M")
    } else if num >= 1_000 {
        scaled(num as f64 / 1_000.0, "K")
    } else {
        num.to_string()
    }
}

/// Renders a date as `YYYY. MM. DD.`, falling back to today when the input
/// cannot be parsed.
pub fn format_date(input: &str) -> String {
    format_date_or(input, Utc::now())
}

pub fn format_date_or(input: &str, fallback: DateTime<Utc>) -> String {
    let date = parse_date(input).unwrap_or_else(|| {
        debug!("Unparseable date {:?}, using fallback", input);
        fallback.date_naive()
    });
    dotted_date(date)
}

/// Same as [`format_date`] for numeric timestamps, seconds or milliseconds.
pub fn format_timestamp(value: i64) -> String {
    timestamp_to_date(value)
        .map(dotted_date)
        .unwrap_or_else(|| dotted_date(Utc::now().date_naive()))
}

fn dotted_date(date: NaiveDate) -> String {
    format!("{}. {:02}. {:02}.", date.year(), date.month(), date.day())
}

fn timestamp_to_date(value: i64) -> Option<NaiveDate> {
    // anything past year 33658 in seconds is treated as milliseconds
    let datetime = if value.abs() >= 1_000_000_000_000 {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    };
    datetime.map(|dt| dt.date_naive())
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    // X/Twitter style: "Wed Oct 10 20:19:24 +0000 2018"
    if let Ok(dt) = DateTime::parse_from_str(input, "%a %b %d %H:%M:%S %z %Y") {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return Some(date);
        }
    }
    if let Ok(value) = input.parse::<i64>() {
        return timestamp_to_date(value);
    }

    None
}

/// First `#word` token of a caption.
pub fn extract_hashtag(content: &str) -> Option<String> {
    HASHTAG_REGEX.find(content).map(|m| m.as_str().to_string())
}

/// Percent-decodes a URL carried inside the API payload.
pub fn decode_url(encoded: &str) -> Result<String, PlatformError> {
    percent_decode_str(encoded)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| PlatformError::ParsingError(format!("Malformed encoded url: {}", e)))
}
