use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    platform::{DownloadVariant, MediaMetadata, Platform},
    service::{
        device::{ConnectionType, DeviceError, NetworkProbe, PermissionProvider, PermissionResponse},
        gallery::{GalleryError, GalleryService, SaveOutcome},
        http::{cancellable, endpoint, HttpClient, HttpError},
        settings::SettingsService,
    },
};

const MAX_TEMP_FILE_ATTEMPTS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("download url is not available")]
    MissingUrl,
    #[error("platform {0} cannot be downloaded")]
    UnsupportedPlatform(Platform),
    #[error("downloads are limited to Wi-Fi, current connection is {0}")]
    PolicyBlocked(ConnectionType),
    #[error("could not determine network state: {0}")]
    NetworkCheckFailed(String),
    #[error("media library permission denied")]
    PermissionDenied { can_ask_again: bool },
    #[error("permission request failed: {0}")]
    PermissionCheckFailed(String),
    #[error("download failed with status {0}")]
    DownloadFailed(u16),
    #[error("network error: {0}")]
    Network(HttpError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} is already downloading")]
    AlreadyDownloading(String),
    #[error("download cancelled")]
    Cancelled,
    #[error("gallery error: {0}")]
    Gallery(#[from] GalleryError),
}

impl From<HttpError> for DownloadError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Status(status) => DownloadError::DownloadFailed(status),
            HttpError::Cancelled => DownloadError::Cancelled,
            HttpError::Io(e) => DownloadError::Io(e),
            other => DownloadError::Network(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub bytes: u64,
    pub outcome: SaveOutcome,
}

/// Removes the in-flight marker when the download ends, whichever way.
struct InFlightGuard {
    in_flight: Arc<DashMap<String, ()>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

#[derive(Clone)]
pub struct DownloadService {
    http: Arc<dyn HttpClient>,
    network: Arc<dyn NetworkProbe>,
    permissions: Arc<dyn PermissionProvider>,
    settings: SettingsService,
    gallery: GalleryService,
    base_url: Url,
    temp_dir: PathBuf,
    in_flight: Arc<DashMap<String, ()>>,
}

impl DownloadService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        http: Arc<dyn HttpClient>,
        network: Arc<dyn NetworkProbe>,
        permissions: Arc<dyn PermissionProvider>,
        settings: SettingsService,
        gallery: GalleryService,
        base_url: Url,
        temp_dir: PathBuf,
    ) -> Self {
        info!("Initializing DownloadService, temp dir {}", temp_dir.display());
        Self {
            http,
            network,
            permissions,
            settings,
            gallery,
            base_url,
            temp_dir,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Downloads `variant` of `metadata` and places it in the gallery album.
    /// The platform comes from `metadata`, never from the current input text.
    pub async fn download(
        &self,
        metadata: &MediaMetadata,
        variant: &DownloadVariant,
        cancel: &CancellationToken,
    ) -> Result<SavedFile, DownloadError> {
        if variant.url.trim().is_empty() {
            return Err(DownloadError::MissingUrl);
        }
        let platform = metadata.platform;
        if !platform.is_supported() {
            return Err(DownloadError::UnsupportedPlatform(platform));
        }

        let _guard = self.begin(&metadata.source_url, &variant.id)?;

        self.check_policy().await?;
        self.ensure_permission().await?;

        let url = endpoint(
            &self.base_url,
            &["api", platform.as_str(), "download"],
            ("videoUrl", &variant.url),
        )?;
        let (path, file) = self.create_temp_file(platform).await?;

        info!("Downloading {} ({}) to {}", variant.id, variant.label, path.display());
        let bytes = match self.fetch_to_file(&url, file, cancel).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(&path).await {
                    debug!("Could not remove partial file {}: {}", path.display(), remove_err);
                }
                return Err(e);
            }
        };
        info!("Downloaded {} bytes", bytes);

        let outcome = self.gallery.save_to_album(&path, self.gallery.album_name()).await?;

        Ok(SavedFile { path, bytes, outcome })
    }

    fn begin(&self, source_url: &str, variant_id: &str) -> Result<InFlightGuard, DownloadError> {
        let key = format!("{}#{}", source_url, variant_id);
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => Err(DownloadError::AlreadyDownloading(variant_id.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(());
                Ok(InFlightGuard {
                    in_flight: Arc::clone(&self.in_flight),
                    key,
                })
            }
        }
    }

    pub fn is_downloading(&self, source_url: &str, variant_id: &str) -> bool {
        self.in_flight.contains_key(&format!("{}#{}", source_url, variant_id))
    }

    /// Fails closed: with Wi-Fi-only on, an unanswerable network query blocks
    /// the download.
    async fn check_policy(&self) -> Result<(), DownloadError> {
        if !self.settings.wifi_only() {
            return Ok(());
        }

        let connection = self
            .network
            .connection_type()
            .await
            .map_err(|e| DownloadError::NetworkCheckFailed(e.to_string()))?;

        if connection.is_wifi() {
            Ok(())
        } else {
            warn!("Download blocked by Wi-Fi-only policy on {} connection", connection);
            Err(DownloadError::PolicyBlocked(connection))
        }
    }

    async fn ensure_permission(&self) -> Result<(), DownloadError> {
        let map_err = |e: DeviceError| DownloadError::PermissionCheckFailed(e.to_string());

        if self.permissions.get_permissions().await.map_err(map_err)?.is_granted() {
            return Ok(());
        }

        let response = self.permissions.request_permissions().await.map_err(map_err)?;
        if response.is_granted() {
            return Ok(());
        }

        warn!("Media library permission refused (can ask again: {})", response.can_ask_again);
        Err(DownloadError::PermissionDenied {
            can_ask_again: response.can_ask_again,
        })
    }

    /// Claims a fresh `video_{platform}_{ms}.mp4`; downloads started in the
    /// same millisecond get a `_1`, `_2`, ... suffix.
    async fn create_temp_file(&self, platform: Platform) -> Result<(PathBuf, fs::File), DownloadError> {
        fs::create_dir_all(&self.temp_dir).await?;
        let stem = format!("video_{}_{}", platform, Utc::now().timestamp_millis());

        for attempt in 0..MAX_TEMP_FILE_ATTEMPTS {
            let file_name = match attempt {
                0 => format!("{}.mp4", stem),
                n => format!("{}_{}.mp4", stem, n),
            };
            let path = self.temp_dir.join(file_name);
            match fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(DownloadError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("no free temp file name for {}", stem),
        )))
    }

    async fn fetch_to_file(
        &self,
        url: &Url,
        mut file: fs::File,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        let bytes = cancellable(cancel, async {
            self.http.download(url, &mut file).await.map_err(DownloadError::from)
        })
        .await?;
        file.sync_all().await?;
        Ok(bytes)
    }

    /// Asks for the media permission once at startup; a refusal is only logged
    /// since downloads ask again.
    pub async fn warm_up_permission(&self) {
        match self.permissions.get_permissions().await {
            Ok(response) if response.is_granted() => return,
            Ok(_) => {}
            Err(e) => {
                error!("Permission request error: {}", e);
                return;
            }
        }

        match self.permissions.request_permissions().await {
            Ok(response) if response.is_granted() => info!("Media library permission granted"),
            Ok(response) if !response.can_ask_again => info!("Permission permanently denied"),
            Ok(_) => info!("Media library permission not granted"),
            Err(e) => error!("Permission request error: {}", e),
        }
    }

    pub async fn permission_status(&self) -> Result<PermissionResponse, DeviceError> {
        self.permissions.get_permissions().await
    }

    pub async fn open_settings(&self) -> Result<(), DeviceError> {
        self.permissions.open_settings().await
    }
}
