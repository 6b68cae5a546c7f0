use serde::Deserialize;
use serde_json::Value;

use super::{
    decode_url, extract_hashtag, format_date, format_number, format_timestamp, ClassifiedUrl, DownloadVariant,
    MediaAuthor, MediaMetadata, MediaStat, Platform, PlatformError, StatKind,
};

const UNKNOWN_NAME: &str = "Unknown";
const UNKNOWN_HANDLE: &str = "@unknown";
const DEFAULT_VARIANT_LABEL: &str = "mp4";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApiMedia {
    thumbnail: Option<String>,
    user: Option<ApiUser>,
    created_at: Option<Value>,
    content: Option<String>,
    stats: Option<ApiStats>,
    video_items: Option<Vec<ApiVideoItem>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApiUser {
    name: Option<String>,
    screen_name: Option<String>,
    avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApiStats {
    view_count: Option<Value>,
    favorite_count: Option<Value>,
    reply_count: Option<Value>,
    share_count: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiVideoItem {
    quality: Option<Value>,
    bitrate: Option<Value>,
    #[serde(alias = "contentType")]
    content_type: Option<String>,
    url: Option<String>,
}

/// Maps one extraction API response into the normalized view model. Missing
/// fields fall back to placeholders, only a structurally wrong payload fails.
pub fn map_metadata(source: &ClassifiedUrl, body: Value) -> Result<MediaMetadata, PlatformError> {
    let body = unwrap_payload(source.platform, body)?;
    let media: ApiMedia = serde_json::from_value(body)
        .map_err(|e| PlatformError::ParsingError(format!("Failed to deserialize media: {}", e)))?;

    let variants = media
        .video_items
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, item)| map_variant(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MediaMetadata {
        source_url: source.raw.clone(),
        platform: source.platform,
        thumbnail: media.thumbnail.filter(|t| !t.is_empty()),
        author: map_author(media.user),
        date: media.created_at.as_ref().map(map_date).unwrap_or_default(),
        tag: media.content.as_deref().and_then(extract_hashtag),
        stats: media.stats.map(map_stats).unwrap_or_default(),
        variants,
    })
}

/// Instagram answers with an array, every other platform with an object.
fn unwrap_payload(platform: Platform, body: Value) -> Result<Value, PlatformError> {
    match (platform, body) {
        (Platform::Instagram, Value::Array(items)) => items
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::ParsingError("Empty instagram response".to_string())),
        (_, body @ Value::Object(_)) => Ok(body),
        (_, other) => Err(PlatformError::ParsingError(format!(
            "Unexpected response shape: {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.as_str()).filter(|s| !s.is_empty())
}

fn map_author(user: Option<ApiUser>) -> MediaAuthor {
    let user = user.unwrap_or_default();
    let name = non_empty(user.name.as_ref())
        .or_else(|| non_empty(user.screen_name.as_ref()))
        .unwrap_or(UNKNOWN_NAME)
        .to_string();
    let handle = non_empty(user.screen_name.as_ref())
        .map(|screen_name| format!("@{}", screen_name))
        .unwrap_or_else(|| UNKNOWN_HANDLE.to_string());

    MediaAuthor {
        name,
        handle,
        avatar: user.avatar.filter(|a| !a.is_empty()),
    }
}

fn map_date(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() => String::new(),
        Value::String(s) => format_date(s),
        Value::Number(n) => match n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)) {
            Some(timestamp) => format_timestamp(timestamp),
            None => format_date(&n.to_string()),
        },
        _ => String::new(),
    }
}

fn counter(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn map_stats(stats: ApiStats) -> Vec<MediaStat> {
    [
        (StatKind::Views, stats.view_count.as_ref()),
        (StatKind::Likes, stats.favorite_count.as_ref()),
        (StatKind::Comments, stats.reply_count.as_ref()),
        (StatKind::Shares, stats.share_count.as_ref()),
    ]
    .into_iter()
    .map(|(kind, value)| MediaStat {
        kind,
        value: format_number(counter(value)),
    })
    .collect()
}

fn label_part(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn map_variant(index: usize, item: ApiVideoItem) -> Result<DownloadVariant, PlatformError> {
    let label = label_part(item.quality.as_ref())
        .or_else(|| label_part(item.bitrate.as_ref()))
        .or_else(|| item.content_type.clone().filter(|c| !c.is_empty()))
        .unwrap_or_else(|| DEFAULT_VARIANT_LABEL.to_string());

    Ok(DownloadVariant {
        id: format!("video-{}", index),
        label,
        url: decode_url(item.url.as_deref().unwrap_or_default())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tiktok() -> ClassifiedUrl {
        ClassifiedUrl::new("https://www.tiktok.com/@user/video/123")
    }

    #[test]
    fn test_map_full_response() {
        let body = json!({
            "thumbnail": "https://cdn/thumb.jpg",
            "user": { "name": "Jane", "screenName": "jane_doe", "avatar": "https://cdn/a.jpg" },
            "createdAt": "2025-11-14T08:30:00Z",
            "content": "watch this #movie #fun",
            "stats": { "viewCount": 5300000, "favoriteCount": 100800, "replyCount": 303, "shareCount": "2600" },
            "videoItems": [
                { "quality": "720p", "url": "https%3A%2F%2Fcdn%2Fv.mp4" },
                { "bitrate": 1200000, "url": "https%3A%2F%2Fcdn%2Fb.mp4" },
                { "content_type": "video/mp4", "url": "https://cdn/c.mp4" },
                {}
            ]
        });

        let metadata = map_metadata(&tiktok(), body).unwrap();

        assert_eq!(metadata.platform, Platform::TikTok);
        assert_eq!(metadata.source_url, "https://www.tiktok.com/@user/video/123");
        assert_eq!(metadata.thumbnail.as_deref(), Some("https://cdn/thumb.jpg"));
        assert_eq!(metadata.author.name, "Jane");
        assert_eq!(metadata.author.handle, "@jane_doe");
        assert_eq!(metadata.author.avatar.as_deref(), Some("https://cdn/a.jpg"));
        assert_eq!(metadata.date, "2025. 11. 14.");
        assert_eq!(metadata.tag.as_deref(), Some("#movie"));
        assert_eq!(metadata.stat(StatKind::Views), Some("5.3M"));
        assert_eq!(metadata.stat(StatKind::Likes), Some("100.8K"));
        assert_eq!(metadata.stat(StatKind::Comments), Some("303"));
        assert_eq!(metadata.stat(StatKind::Shares), Some("2.6K"));

        let labels: Vec<_> = metadata.variants.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, ["720p", "1200000", "video/mp4", "mp4"]);
        assert_eq!(metadata.variants[0].id, "video-0");
        assert_eq!(metadata.variants[0].url, "https://cdn/v.mp4");
        assert_eq!(metadata.variants[2].url, "https://cdn/c.mp4");
        assert_eq!(metadata.variants[3].url, "");
    }

    #[test]
    fn test_map_partial_response_uses_placeholders() {
        let metadata = map_metadata(&tiktok(), json!({})).unwrap();

        assert_eq!(metadata.author.name, "Unknown");
        assert_eq!(metadata.author.handle, "@unknown");
        assert_eq!(metadata.author.avatar, None);
        assert_eq!(metadata.date, "");
        assert_eq!(metadata.tag, None);
        assert!(metadata.stats.is_empty());
        assert!(metadata.variants.is_empty());
    }

    #[test]
    fn test_map_author_falls_back_to_screen_name() {
        let body = json!({ "user": { "name": "", "screenName": "only_handle" }, "stats": {} });
        let metadata = map_metadata(&tiktok(), body).unwrap();
        assert_eq!(metadata.author.name, "only_handle");
        assert_eq!(metadata.author.handle, "@only_handle");
        // an empty stats object still yields four zeroed counters
        assert_eq!(metadata.stats.len(), 4);
        assert_eq!(metadata.stat(StatKind::Views), Some("0"));
    }

    #[test]
    fn test_instagram_array_is_unwrapped() {
        let source = ClassifiedUrl::new("https://www.instagram.com/reel/ABC/");
        let body = json!([{ "user": { "screenName": "insta" }, "videoItems": [{ "quality": "1080p", "url": "u" }] }]);
        let metadata = map_metadata(&source, body).unwrap();
        assert_eq!(metadata.platform, Platform::Instagram);
        assert_eq!(metadata.author.handle, "@insta");
        assert_eq!(metadata.variants.len(), 1);

        assert!(map_metadata(&source, json!([])).is_err());
    }

    #[test]
    fn test_wrong_shapes_fail() {
        assert!(matches!(
            map_metadata(&tiktok(), json!([{}])),
            Err(PlatformError::ParsingError(_))
        ));
        assert!(matches!(
            map_metadata(&tiktok(), json!("oops")),
            Err(PlatformError::ParsingError(_))
        ));
        assert!(matches!(
            map_metadata(&tiktok(), json!({ "videoItems": "nope" })),
            Err(PlatformError::ParsingError(_))
        ));
        assert!(matches!(
            map_metadata(&tiktok(), json!({ "videoItems": [{ "url": "%FF" }] })),
            Err(PlatformError::ParsingError(_))
        ));
    }

    #[test]
    fn test_numeric_created_at() {
        let metadata = map_metadata(&tiktok(), json!({ "createdAt": 1700000000 })).unwrap();
        assert_eq!(metadata.date, "2023. 11. 14.");
    }

    #[test]
    fn test_fractional_created_at() {
        let metadata = map_metadata(&tiktok(), json!({ "createdAt": 1.7e9 })).unwrap();
        assert_eq!(metadata.date, "2023. 11. 14.");

        let metadata = map_metadata(&tiktok(), json!({ "createdAt": 1.0e300 })).unwrap();
        assert!(!metadata.date.is_empty());
    }
}
