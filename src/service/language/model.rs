use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "jp")]
    Japanese,
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "vi")]
    Vietnamese,
    #[serde(rename = "es")]
    Spanish,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::English,
        Language::Korean,
        Language::Japanese,
        Language::Portuguese,
        Language::French,
        Language::Vietnamese,
        Language::Spanish,
    ];

    /// Stored code, also the dictionary name under `locales/`.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Korean => "ko",
            Language::Japanese => "jp",
            Language::Portuguese => "pt",
            Language::French => "fr",
            Language::Vietnamese => "vi",
            Language::Spanish => "es",
        }
    }

    /// Native name shown on the language picker.
    pub fn label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Korean => "한국어",
            Language::Japanese => "日本語",
            Language::Portuguese => "Português",
            Language::French => "Français",
            Language::Vietnamese => "Tiếng Việt",
            Language::Spanish => "Español",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ko" | "korean" => Ok(Language::Korean),
            "jp" | "ja" | "japanese" => Ok(Language::Japanese),
            "pt" | "portuguese" => Ok(Language::Portuguese),
            "fr" | "french" => Ok(Language::French),
            "vi" | "vietnamese" => Ok(Language::Vietnamese),
            "es" | "spanish" => Ok(Language::Spanish),
            _ => Err(format!("Unknown language code: {}", s)),
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// What to do on a launch with no stored language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstRunPolicy {
    /// Route to the language picker.
    Prompt,
    /// Continue in English without asking.
    DefaultEnglish,
}

impl FromStr for FirstRunPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prompt" => Ok(FirstRunPolicy::Prompt),
            "default_english" | "default-english" | "english" => Ok(FirstRunPolicy::DefaultEnglish),
            _ => Err(format!("Unknown first run policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupRoute {
    LanguageSelection,
    Home(Language),
}
