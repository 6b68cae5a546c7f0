use crate::{
    config::ConfigError,
    platform::PlatformError,
    service::{
        device::DeviceError, http::HttpError, AdError, DownloadError, GalleryError, Language, MetadataError,
    },
    storage::StorageError,
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Http error: {0}")]
    Http(#[from] HttpError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    #[error("Gallery error: {0}")]
    Gallery(#[from] GalleryError),

    #[error("Ad error: {0}")]
    Ad(#[from] AdError),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("App state error: {0}")]
    AppState(String),

    #[error("Usage: {0}")]
    Usage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// What the user sees when an action fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    /// Offer the deep link into the system settings.
    pub offer_settings: bool,
}

impl AppError {
    pub fn alert(&self, language: Language) -> Alert {
        let locale = language.code();
        let error_title = t!("alerts.error_title", locale = locale).to_string();

        let (title, message, offer_settings) = match self {
            AppError::Platform(e) | AppError::Metadata(MetadataError::InvalidUrl(e)) => {
                (error_title, Self::platform_message(e, locale), false)
            }
            AppError::Metadata(MetadataError::Network(_) | MetadataError::Parse(_)) => {
                (error_title, t!("alerts.fetch_failed", locale = locale).to_string(), false)
            }
            AppError::Metadata(MetadataError::Cancelled) | AppError::Download(DownloadError::Cancelled) => {
                (error_title, t!("alerts.cancelled", locale = locale).to_string(), false)
            }
            AppError::Download(e) => return Self::download_alert(e, error_title, locale),
            AppError::Gallery(GalleryError::ShareUnavailable) => {
                (error_title, t!("alerts.share_unavailable", locale = locale).to_string(), false)
            }
            AppError::Gallery(_) => (error_title, t!("alerts.save_failed", locale = locale).to_string(), false),
            AppError::Usage(usage) => (error_title, usage.clone(), false),
            _ => (error_title, t!("alerts.generic", locale = locale).to_string(), false),
        };

        Alert {
            title,
            message,
            offer_settings,
        }
    }

    fn platform_message(error: &PlatformError, locale: &str) -> String {
        match error {
            PlatformError::EmptyUrl => t!("alerts.empty_url", locale = locale).to_string(),
            _ => t!("alerts.invalid_url", locale = locale).to_string(),
        }
    }

    fn download_alert(error: &DownloadError, error_title: String, locale: &str) -> Alert {
        let alert = |title: String, message: String, offer_settings: bool| Alert {
            title,
            message,
            offer_settings,
        };

        match error {
            DownloadError::MissingUrl => alert(error_title, t!("alerts.missing_url", locale = locale).to_string(), false),
            DownloadError::UnsupportedPlatform(_) => {
                alert(error_title, t!("alerts.invalid_url", locale = locale).to_string(), false)
            }
            DownloadError::PolicyBlocked(_) => alert(
                t!("alerts.wifi_only_title", locale = locale).to_string(),
                t!("alerts.wifi_only", locale = locale).to_string(),
                false,
            ),
            DownloadError::NetworkCheckFailed(_) => alert(
                error_title,
                t!("alerts.network_check_failed", locale = locale).to_string(),
                false,
            ),
            DownloadError::PermissionDenied { can_ask_again: false } => alert(
                t!("alerts.permission_title", locale = locale).to_string(),
                t!("alerts.permission_permanent", locale = locale).to_string(),
                true,
            ),
            DownloadError::PermissionDenied { can_ask_again: true } => alert(
                t!("alerts.permission_title", locale = locale).to_string(),
                t!("alerts.permission_denied", locale = locale).to_string(),
                false,
            ),
            DownloadError::PermissionCheckFailed(_) => alert(
                t!("alerts.permission_title", locale = locale).to_string(),
                t!("alerts.permission_error", locale = locale).to_string(),
                false,
            ),
            DownloadError::DownloadFailed(status) => alert(
                error_title,
                t!("alerts.download_failed", locale = locale, status = status).to_string(),
                false,
            ),
            DownloadError::AlreadyDownloading(_) => alert(
                error_title,
                t!("alerts.already_downloading", locale = locale).to_string(),
                false,
            ),
            DownloadError::Cancelled => alert(error_title, t!("alerts.cancelled", locale = locale).to_string(), false),
            DownloadError::Gallery(GalleryError::ShareUnavailable) => alert(
                error_title,
                t!("alerts.share_unavailable", locale = locale).to_string(),
                false,
            ),
            DownloadError::Gallery(_) => alert(error_title, t!("alerts.save_failed", locale = locale).to_string(), false),
            DownloadError::Network(_) | DownloadError::Io(_) => {
                alert(error_title, t!("alerts.generic", locale = locale).to_string(), false)
            }
        }
    }
}
