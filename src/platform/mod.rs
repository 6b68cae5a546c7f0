mod error;
mod mapper;
mod model;
mod util;

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

pub use error::*;
pub use mapper::map_metadata;
pub use model::*;
pub use util::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum Platform {
    #[serde(rename = "x")]
    X,
    #[serde(rename = "tiktok")]
    TikTok,
    #[serde(rename = "youtube")]
    YouTube,
    #[serde(rename = "instagram")]
    Instagram,
    #[serde(rename = "facebook")]
    Facebook,
    #[serde(rename = "9gag")]
    NineGag,
    #[serde(rename = "dailymotion")]
    DailyMotion,
    #[serde(rename = "unknown")]
    Unknown,
}

/// Checked in order, first hit wins.
const CLASSIFICATION_RULES: [(&[&str], Platform); 7] = [
    (&["x.com", "twitter.com"], Platform::X),
    (&["tiktok"], Platform::TikTok),
    (&["youtu.be", "youtube.com"], Platform::YouTube),
    (&["instagram"], Platform::Instagram),
    (&["facebook"], Platform::Facebook),
    (&["9gag"], Platform::NineGag),
    (&["dailymotion"], Platform::DailyMotion),
];

impl Platform {
    pub const SUPPORTED: [Platform; 7] = [
        Platform::X,
        Platform::TikTok,
        Platform::YouTube,
        Platform::Instagram,
        Platform::Facebook,
        Platform::NineGag,
        Platform::DailyMotion,
    ];

    /// Maps any input text to a platform by substring containment. No URL
    /// validation happens here, the extraction API re-validates.
    pub fn classify(url: &str) -> Platform {
        let haystack = url.to_lowercase();
        CLASSIFICATION_RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| haystack.contains(needle)))
            .map(|(_, platform)| *platform)
            .unwrap_or(Platform::Unknown)
    }

    /// Path segment used by the extraction API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::TikTok => "tiktok",
            Self::YouTube => "youtube",
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
            Self::NineGag => "9gag",
            Self::DailyMotion => "dailymotion",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" | "twitter" => Ok(Self::X),
            "tiktok" => Ok(Self::TikTok),
            "youtube" => Ok(Self::YouTube),
            "instagram" => Ok(Self::Instagram),
            "facebook" => Ok(Self::Facebook),
            "9gag" => Ok(Self::NineGag),
            "dailymotion" => Ok(Self::DailyMotion),
            _ => Err(PlatformError::InvalidPlatform(s.to_string())),
        }
    }
}
