use serde::{Deserialize, Serialize};

use super::{Platform, PlatformError};

/// Raw input text together with the platform it classified as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedUrl {
    pub raw: String,
    pub platform: Platform,
}

impl ClassifiedUrl {
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let platform = Platform::classify(&raw);
        Self { raw, platform }
    }

    /// Classifies and rejects input that cannot be sent to the extraction API.
    pub fn parse(raw: &str) -> Result<Self, PlatformError> {
        let classified = Self::new(raw);
        if classified.raw.is_empty() {
            return Err(PlatformError::EmptyUrl);
        }
        if !classified.platform.is_supported() {
            return Err(PlatformError::InvalidUrl(classified.raw));
        }
        Ok(classified)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaAuthor {
    pub name: String,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Views,
    Likes,
    Comments,
    Shares,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaStat {
    pub kind: StatKind,
    pub value: String,
}

/// One downloadable rendition offered by the extraction API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadVariant {
    pub id: String,
    pub label: String,
    pub url: String,
}

/// Normalized view of one metadata response. The platform is captured at fetch
/// time so downloads never re-read the (possibly edited) input text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaMetadata {
    pub source_url: String,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub author: MediaAuthor,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub stats: Vec<MediaStat>,
    pub variants: Vec<DownloadVariant>,
}

impl MediaMetadata {
    pub fn variant(&self, id: &str) -> Option<&DownloadVariant> {
        self.variants.iter().find(|v| v.id == id)
    }

    pub fn stat(&self, kind: StatKind) -> Option<&str> {
        self.stats.iter().find(|s| s.kind == kind).map(|s| s.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classified_url_parse() {
        let url = ClassifiedUrl::parse("  https://www.tiktok.com/@user/video/123 ").unwrap();
        assert_eq!(url.raw, "https://www.tiktok.com/@user/video/123");
        assert_eq!(url.platform, Platform::TikTok);

        assert!(matches!(ClassifiedUrl::parse("   "), Err(PlatformError::EmptyUrl)));
        assert!(matches!(
            ClassifiedUrl::parse("https://vimeo.com/1"),
            Err(PlatformError::InvalidUrl(_))
        ));
    }
}
