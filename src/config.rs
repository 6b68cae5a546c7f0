use std::{path::PathBuf, str::FromStr, sync::OnceLock, time::Duration};

use url::Url;

use crate::service::{device::ConnectionType, language::FirstRunPolicy};

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

const DEFAULT_API_BASE_URL: &str = "https://ssdown.app";
const DEFAULT_ALBUM_NAME: &str = "ssdown";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    Invalid(String),
    #[error("Config already initialized")]
    AlreadyInitialized,
    #[error("Config not initialized")]
    NotInitialized,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub gallery: GalleryConfig,
    pub ad: AdConfig,
    pub language: LanguageConfig,
    pub device: DeviceConfig,
}

impl AppConfig {
    pub fn set_global(config: AppConfig) -> Result<(), ConfigError> {
        APP_CONFIG.set(config).map_err(|_| ConfigError::AlreadyInitialized)
    }

    pub fn get() -> Result<&'static AppConfig, ConfigError> {
        APP_CONFIG.get().ok_or(ConfigError::NotInitialized)
    }

    pub fn from_env() -> Result<AppConfig, ConfigError> {
        build_config(|key| std::env::var(key).ok())
    }
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: Url,
    /// Deadline for a whole metadata request, and for each body chunk of a download.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    /// Holds `settings.json`, the language key and the ad timestamp.
    pub data_dir: PathBuf,
    pub temp_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct GalleryConfig {
    pub root: PathBuf,
    pub album_name: String,
    pub page_size: usize,
}

#[derive(Clone, Debug)]
pub struct AdConfig {
    pub cooldown: Duration,
    pub reward_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct LanguageConfig {
    pub first_run: FirstRunPolicy,
}

#[derive(Clone, Debug)]
pub struct DeviceConfig {
    /// Reported by the desktop network probe.
    pub connection: ConnectionType,
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError> {
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid(key.to_string())),
        None => Ok(default),
    }
}

fn path_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: PathBuf) -> PathBuf {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

/// Builds the config from `SSDOWN_*` keys, every key has a default.
pub fn build_config(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig, ConfigError> {
    info!("Building AppConfig...");

    let base_url = parse_or(&lookup, "SSDOWN_API_BASE_URL", Url::parse(DEFAULT_API_BASE_URL).map_err(|_| {
        ConfigError::Invalid("SSDOWN_API_BASE_URL".to_string())
    })?)?;
    if base_url.cannot_be_a_base() {
        return Err(ConfigError::Invalid("SSDOWN_API_BASE_URL".to_string()));
    }

    let data_dir = path_or(
        &lookup,
        "SSDOWN_DATA_DIR",
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("ssdown"),
    );
    let temp_dir = path_or(&lookup, "SSDOWN_TEMP_DIR", std::env::temp_dir().join("ssdown").join("temp"));
    let gallery_root = path_or(
        &lookup,
        "SSDOWN_GALLERY_DIR",
        dirs::video_dir().unwrap_or_else(|| data_dir.join("gallery")),
    );

    let album_name: String = parse_or(&lookup, "SSDOWN_ALBUM_NAME", DEFAULT_ALBUM_NAME.to_string())?;
    if album_name.contains(['/', '\\']) {
        return Err(ConfigError::Invalid("SSDOWN_ALBUM_NAME".to_string()));
    }

    let config = AppConfig {
        api: ApiConfig {
            base_url,
            request_timeout: Duration::from_secs(parse_or(&lookup, "SSDOWN_REQUEST_TIMEOUT_SECS", 30u64)?),
            connect_timeout: Duration::from_secs(parse_or(&lookup, "SSDOWN_CONNECT_TIMEOUT_SECS", 30u64)?),
        },
        storage: StorageConfig { data_dir, temp_dir },
        gallery: GalleryConfig {
            root: gallery_root,
            album_name,
            page_size: parse_or(&lookup, "SSDOWN_GALLERY_PAGE_SIZE", 100usize)?,
        },
        ad: AdConfig {
            cooldown: Duration::from_secs(parse_or(&lookup, "SSDOWN_AD_COOLDOWN_SECS", 600u64)?),
            reward_timeout: Duration::from_secs(parse_or(&lookup, "SSDOWN_REWARD_TIMEOUT_SECS", 60u64)?),
        },
        language: LanguageConfig {
            first_run: parse_or(&lookup, "SSDOWN_LANGUAGE_FIRST_RUN", FirstRunPolicy::Prompt)?,
        },
        device: DeviceConfig {
            connection: parse_or(&lookup, "SSDOWN_CONNECTION", ConnectionType::Wifi)?,
        },
    };
    info!("AppConfig built");

    Ok(config)
}
