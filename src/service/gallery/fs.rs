use std::{
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use async_trait::async_trait;
use tokio::fs;

use super::{Album, Asset, AssetPage, GalleryError, MediaLibrary};

const LIBRARY_DIR: &str = ".library";
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "m4v", "webm"];

/// Gallery backed by plain directories: every album is a folder under `root`,
/// assets not yet placed in an album wait in `root/.library`.
#[derive(Debug, Clone)]
pub struct FsMediaLibrary {
    root: PathBuf,
}

impl FsMediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn album_dir(&self, name: &str) -> Result<PathBuf, GalleryError> {
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(GalleryError::WriteFailed(format!("invalid album name: {}", name)));
        }
        Ok(self.root.join(name))
    }

    async fn move_into(&self, asset: &Asset, dir: &Path) -> Result<(), GalleryError> {
        let target = dir.join(&asset.filename);
        if asset.uri == target {
            return Ok(());
        }
        if fs::try_exists(&target).await? {
            debug!("{} already in {}", asset.filename, dir.display());
            return self.remove_staged(asset).await;
        }
        fs::rename(&asset.uri, &target)
            .await
            .map_err(|e| GalleryError::WriteFailed(format!("move {}: {}", asset.filename, e)))
    }

    /// Removes the `.library` copy of an asset; files outside staging are left alone.
    async fn remove_staged(&self, asset: &Asset) -> Result<(), GalleryError> {
        if asset.uri.parent() != Some(self.root.join(LIBRARY_DIR).as_path()) {
            return Ok(());
        }
        match fs::remove_file(&asset.uri).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn asset_from_path(path: PathBuf) -> Result<Asset, GalleryError> {
        let metadata = fs::metadata(&path).await?;
        let created_at_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64);
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Asset {
            id: filename.clone(),
            filename,
            uri: path,
            created_at_ms,
            duration_secs: None,
        })
    }

    fn is_video(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

#[async_trait]
impl MediaLibrary for FsMediaLibrary {
    async fn create_asset(&self, file: &Path) -> Result<Asset, GalleryError> {
        let filename = file
            .file_name()
            .ok_or_else(|| GalleryError::WriteFailed(format!("not a file: {}", file.display())))?;
        let staging = self.root.join(LIBRARY_DIR);
        fs::create_dir_all(&staging).await?;

        let target = staging.join(filename);
        fs::copy(file, &target)
            .await
            .map_err(|e| GalleryError::WriteFailed(format!("copy {}: {}", file.display(), e)))?;

        Self::asset_from_path(target).await
    }

    async fn get_album(&self, name: &str) -> Result<Option<Album>, GalleryError> {
        let dir = self.album_dir(name)?;
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(Some(Album {
                id: name.to_string(),
                title: name.to_string(),
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_album(&self, name: &str, asset: &Asset) -> Result<Album, GalleryError> {
        let dir = self.album_dir(name)?;
        fs::create_dir_all(&dir).await?;
        self.move_into(asset, &dir).await?;

        Ok(Album {
            id: name.to_string(),
            title: name.to_string(),
        })
    }

    async fn add_assets_to_album(&self, assets: &[Asset], album: &Album) -> Result<(), GalleryError> {
        let dir = self.album_dir(&album.id)?;
        for asset in assets {
            self.move_into(asset, &dir).await?;
        }
        Ok(())
    }

    async fn get_assets(&self, album: &Album, first: usize) -> Result<AssetPage, GalleryError> {
        let dir = self.album_dir(&album.id)?;
        let mut entries = fs::read_dir(&dir).await?;
        let mut assets = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if Self::is_video(&path) {
                assets.push(Self::asset_from_path(path).await?);
            }
        }

        assets.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then_with(|| b.filename.cmp(&a.filename)));
        let total_count = assets.len();
        assets.truncate(first);

        Ok(AssetPage { assets, total_count })
    }

    async fn discard_asset(&self, asset: &Asset) -> Result<(), GalleryError> {
        self.remove_staged(asset).await
    }

    async fn delete_assets(&self, assets: &[Asset]) -> Result<(), GalleryError> {
        for asset in assets {
            match fs::remove_file(&asset.uri).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(GalleryError::NotFound(asset.id.clone()));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
