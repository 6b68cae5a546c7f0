mod fs;
mod util;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use fs::FsMediaLibrary;
pub use util::{format_asset_date, format_duration};

pub const VIDEO_MIME_TYPE: &str = "video/mp4";
const MOVIE_UTI: &str = "public.movie";

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("gallery write failed: {0}")]
    WriteFailed(String),
    #[error("share failed: {0}")]
    ShareFailed(String),
    #[error("sharing is not available")]
    ShareUnavailable,
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub filename: String,
    pub uri: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetPage {
    pub assets: Vec<Asset>,
    pub total_count: usize,
}

/// Device media gallery.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn create_asset(&self, file: &Path) -> Result<Asset, GalleryError>;
    async fn get_album(&self, name: &str) -> Result<Option<Album>, GalleryError>;
    /// Creates the album seeded with `asset`.
    async fn create_album(&self, name: &str, asset: &Asset) -> Result<Album, GalleryError>;
    async fn add_assets_to_album(&self, assets: &[Asset], album: &Album) -> Result<(), GalleryError>;
    /// Video assets of `album`, newest first, at most `first` of them.
    async fn get_assets(&self, album: &Album, first: usize) -> Result<AssetPage, GalleryError>;
    async fn delete_assets(&self, assets: &[Asset]) -> Result<(), GalleryError>;
    /// Drops an asset that never made it into an album.
    async fn discard_asset(&self, _asset: &Asset) -> Result<(), GalleryError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareOptions {
    pub mime_type: String,
    pub dialog_title: String,
    pub uti: Option<String>,
}

impl ShareOptions {
    pub fn video(dialog_title: impl Into<String>) -> Self {
        Self {
            mime_type: VIDEO_MIME_TYPE.to_string(),
            dialog_title: dialog_title.into(),
            uti: Some(MOVIE_UTI.to_string()),
        }
    }
}

/// System share dialog.
#[async_trait]
pub trait ShareSheet: Send + Sync {
    async fn is_available(&self) -> bool;
    async fn share(&self, file: &Path, options: &ShareOptions) -> Result<(), GalleryError>;
}

/// Stand-in for platforms without a share dialog.
#[derive(Debug, Clone, Default)]
pub struct NoShareSheet;

#[async_trait]
impl ShareSheet for NoShareSheet {
    async fn is_available(&self) -> bool {
        false
    }

    async fn share(&self, _file: &Path, _options: &ShareOptions) -> Result<(), GalleryError> {
        Err(GalleryError::ShareUnavailable)
    }
}

/// Where a downloaded file ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    SavedToAlbum { album: String, asset: Asset },
    /// The album could not be written, the file went to the share dialog.
    Shared { path: PathBuf },
    /// Neither album nor share dialog worked, the user only gets the path.
    PathReported { path: PathBuf },
}

#[derive(Clone)]
pub struct GalleryService {
    library: Arc<dyn MediaLibrary>,
    share_sheet: Arc<dyn ShareSheet>,
    album_name: String,
    page_size: usize,
}

impl GalleryService {
    pub fn new(
        library: Arc<dyn MediaLibrary>,
        share_sheet: Arc<dyn ShareSheet>,
        album_name: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            library,
            share_sheet,
            album_name: album_name.into(),
            page_size,
        }
    }

    pub fn album_name(&self) -> &str {
        &self.album_name
    }

    /// Saves `file` into the named album, falling back to the share dialog and
    /// then to reporting the raw path. Only a failing share dialog is an error.
    pub async fn save_to_album(&self, file: &Path, album_name: &str) -> Result<SaveOutcome, GalleryError> {
        match self.insert_into_album(file, album_name).await {
            Ok(asset) => {
                info!("Saved {} to album {}", asset.filename, album_name);
                Ok(SaveOutcome::SavedToAlbum {
                    album: album_name.to_string(),
                    asset,
                })
            }
            Err(e) => {
                error!("Media library error: {}", e);
                if self.share_sheet.is_available().await {
                    info!("Falling back to share dialog for {}", file.display());
                    self.share_sheet
                        .share(file, &ShareOptions::video(t!("gallery.save_dialog_title")))
                        .await?;
                    Ok(SaveOutcome::Shared {
                        path: file.to_path_buf(),
                    })
                } else {
                    warn!("Share dialog unavailable, reporting path {}", file.display());
                    Ok(SaveOutcome::PathReported {
                        path: file.to_path_buf(),
                    })
                }
            }
        }
    }

    async fn insert_into_album(&self, file: &Path, album_name: &str) -> Result<Asset, GalleryError> {
        let asset = self.library.create_asset(file).await?;

        if let Err(e) = self.place_in_album(&asset, album_name).await {
            if let Err(discard_err) = self.library.discard_asset(&asset).await {
                debug!("Could not discard {}: {}", asset.filename, discard_err);
            }
            return Err(e);
        }

        Ok(asset)
    }

    async fn place_in_album(&self, asset: &Asset, album_name: &str) -> Result<(), GalleryError> {
        match self.library.get_album(album_name).await? {
            None => {
                debug!("Album {} missing, creating it", album_name);
                self.library.create_album(album_name, asset).await?;
            }
            Some(album) => {
                self.library
                    .add_assets_to_album(std::slice::from_ref(asset), &album)
                    .await?;
            }
        }
        Ok(())
    }

    /// Videos of the app album, newest first.
    pub async fn list_videos(&self) -> Result<Vec<Asset>, GalleryError> {
        match self.library.get_album(&self.album_name).await? {
            Some(album) => Ok(self.library.get_assets(&album, self.page_size).await?.assets),
            None => Ok(Vec::new()),
        }
    }

    pub async fn video_count(&self) -> Result<usize, GalleryError> {
        match self.library.get_album(&self.album_name).await? {
            Some(album) => Ok(self.library.get_assets(&album, 1).await?.total_count),
            None => Ok(0),
        }
    }

    pub async fn share_asset(&self, asset: &Asset) -> Result<(), GalleryError> {
        if !self.share_sheet.is_available().await {
            return Err(GalleryError::ShareUnavailable);
        }
        self.share_sheet
            .share(&asset.uri, &ShareOptions::video(t!("gallery.share_dialog_title")))
            .await
    }

    pub async fn delete_asset(&self, asset: &Asset) -> Result<(), GalleryError> {
        info!("Deleting asset {}", asset.id);
        self.library.delete_assets(std::slice::from_ref(asset)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test::{FakeMediaLibrary, FakeShareSheet};

    fn gallery(library: Arc<FakeMediaLibrary>, share: Arc<FakeShareSheet>) -> GalleryService {
        GalleryService::new(library, share, "ssdown", 100)
    }

    #[tokio::test]
    async fn test_creates_album_on_first_save() {
        let library = Arc::new(FakeMediaLibrary::new());
        let share = Arc::new(FakeShareSheet::available());
        let gallery = gallery(library.clone(), share.clone());

        let outcome = gallery.save_to_album(Path::new("/tmp/a.mp4"), "ssdown").await.unwrap();
        assert!(matches!(outcome, SaveOutcome::SavedToAlbum { ref album, .. } if album == "ssdown"));
        assert_eq!(library.calls(), ["create_asset", "get_album", "create_album"]);

        gallery.save_to_album(Path::new("/tmp/b.mp4"), "ssdown").await.unwrap();
        assert_eq!(
            library.calls()[3..].to_vec(),
            ["create_asset", "get_album", "add_assets_to_album"]
        );
        assert_eq!(share.share_count(), 0);
        assert_eq!(gallery.video_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_album_failure_falls_back_to_share_once() {
        let library = Arc::new(FakeMediaLibrary::failing());
        let share = Arc::new(FakeShareSheet::available());
        let gallery = gallery(library.clone(), share.clone());

        let outcome = gallery.save_to_album(Path::new("/tmp/a.mp4"), "ssdown").await.unwrap();

        assert_eq!(outcome, SaveOutcome::Shared { path: PathBuf::from("/tmp/a.mp4") });
        assert_eq!(share.share_count(), 1);
        // the album api is not retried after the first failure
        assert_eq!(library.calls(), ["create_asset"]);
        let options = share.last_options().unwrap();
        assert_eq!(options.mime_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_reports_path_when_share_unavailable() {
        let library = Arc::new(FakeMediaLibrary::failing());
        let share = Arc::new(FakeShareSheet::unavailable());
        let gallery = gallery(library, share.clone());

        let outcome = gallery.save_to_album(Path::new("/tmp/a.mp4"), "ssdown").await.unwrap();
        assert_eq!(outcome, SaveOutcome::PathReported { path: PathBuf::from("/tmp/a.mp4") });
        assert_eq!(share.share_count(), 0);
    }

    #[tokio::test]
    async fn test_share_failure_propagates() {
        let library = Arc::new(FakeMediaLibrary::failing());
        let share = Arc::new(FakeShareSheet::broken());
        let gallery = gallery(library, share);

        let result = gallery.save_to_album(Path::new("/tmp/a.mp4"), "ssdown").await;
        assert!(matches!(result, Err(GalleryError::ShareFailed(_))));
    }

    #[tokio::test]
    async fn test_listing_without_album_is_empty() {
        let gallery = gallery(Arc::new(FakeMediaLibrary::new()), Arc::new(FakeShareSheet::unavailable()));
        assert!(gallery.list_videos().await.unwrap().is_empty());
        assert_eq!(gallery.video_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_share_asset_requires_share_sheet() {
        let asset = Asset {
            id: "a".into(),
            filename: "a.mp4".into(),
            uri: PathBuf::from("/tmp/a.mp4"),
            created_at_ms: None,
            duration_secs: None,
        };

        let unavailable = gallery(Arc::new(FakeMediaLibrary::new()), Arc::new(FakeShareSheet::unavailable()));
        assert!(matches!(
            unavailable.share_asset(&asset).await,
            Err(GalleryError::ShareUnavailable)
        ));

        let share = Arc::new(FakeShareSheet::available());
        let available = gallery(Arc::new(FakeMediaLibrary::new()), share.clone());
        available.share_asset(&asset).await.unwrap();
        assert_eq!(share.share_count(), 1);
    }
}
