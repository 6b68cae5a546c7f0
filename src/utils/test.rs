//! Test doubles for the collaborators the services talk to.

use std::{
    collections::HashMap,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};
use url::Url;

use crate::service::{
    ad::{AdError, AdEvent, AdKind, AdProvider},
    device::{ConnectionType, DeviceError, NetworkProbe, PermissionProvider, PermissionResponse, PermissionStatus},
    gallery::{Album, Asset, AssetPage, GalleryError, MediaLibrary, ShareOptions, ShareSheet},
    http::{HttpClient, HttpError},
};

enum Reply {
    Json(Value),
    Bytes(Vec<u8>),
    Status(u16),
    Hang,
}

/// Answers with canned replies and records every requested URL.
#[derive(Default)]
pub struct FakeHttpClient {
    json: Option<Reply>,
    download: Option<Reply>,
    requests: Mutex<Vec<String>>,
}

impl FakeHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.json = Some(Reply::Json(body));
        self
    }

    pub fn with_json_status(mut self, status: u16) -> Self {
        self.json = Some(Reply::Status(status));
        self
    }

    pub fn with_download(mut self, bytes: &[u8]) -> Self {
        self.download = Some(Reply::Bytes(bytes.to_vec()));
        self
    }

    pub fn with_download_status(mut self, status: u16) -> Self {
        self.download = Some(Reply::Status(status));
        self
    }

    pub fn with_hanging_download(mut self) -> Self {
        self.download = Some(Reply::Hang);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn record(&self, url: &Url) {
        self.requests.lock().unwrap().push(url.to_string());
    }
}

#[async_trait]
impl HttpClient for FakeHttpClient {
    async fn get_json(&self, url: &Url) -> Result<Value, HttpError> {
        self.record(url);
        match &self.json {
            Some(Reply::Json(body)) => Ok(body.clone()),
            Some(Reply::Status(status)) => Err(HttpError::Status(*status)),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Bytes(_)) | None => Err(HttpError::Status(404)),
        }
    }

    async fn download(&self, url: &Url, sink: &mut (dyn AsyncWrite + Unpin + Send)) -> Result<u64, HttpError> {
        self.record(url);
        match &self.download {
            Some(Reply::Bytes(bytes)) => {
                sink.write_all(bytes).await?;
                sink.flush().await?;
                Ok(bytes.len() as u64)
            }
            Some(Reply::Status(status)) => Err(HttpError::Status(*status)),
            Some(Reply::Hang) => {
                sink.write_all(b"partial").await?;
                std::future::pending().await
            }
            Some(Reply::Json(_)) | None => Err(HttpError::Status(404)),
        }
    }
}

pub struct FakeNetwork {
    connection: Option<ConnectionType>,
    queries: AtomicUsize,
}

impl FakeNetwork {
    pub fn new(connection: ConnectionType) -> Self {
        Self {
            connection: Some(connection),
            queries: AtomicUsize::new(0),
        }
    }

    /// Every query fails.
    pub fn failing() -> Self {
        Self {
            connection: None,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkProbe for FakeNetwork {
    async fn connection_type(&self) -> Result<ConnectionType, DeviceError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.connection
            .ok_or_else(|| DeviceError::NetworkState("probe offline".into()))
    }
}

pub struct FakePermissions {
    current: Mutex<PermissionResponse>,
    on_request: PermissionResponse,
    requests: AtomicUsize,
}

impl FakePermissions {
    fn with(current: PermissionResponse, on_request: PermissionResponse) -> Self {
        Self {
            current: Mutex::new(current),
            on_request,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn granted() -> Self {
        let granted = PermissionResponse {
            status: PermissionStatus::Granted,
            can_ask_again: true,
        };
        Self::with(granted, granted)
    }

    pub fn denied(can_ask_again: bool) -> Self {
        let denied = PermissionResponse {
            status: PermissionStatus::Denied,
            can_ask_again,
        };
        Self::with(denied, denied)
    }

    /// Undetermined until the first request, which grants.
    pub fn grants_on_request() -> Self {
        Self::with(
            PermissionResponse {
                status: PermissionStatus::Undetermined,
                can_ask_again: true,
            },
            PermissionResponse {
                status: PermissionStatus::Granted,
                can_ask_again: true,
            },
        )
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionProvider for FakePermissions {
    async fn get_permissions(&self) -> Result<PermissionResponse, DeviceError> {
        Ok(*self.current.lock().unwrap())
    }

    async fn request_permissions(&self) -> Result<PermissionResponse, DeviceError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.current.lock().unwrap() = self.on_request;
        Ok(self.on_request)
    }

    async fn open_settings(&self) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// In-memory gallery that records the calls made against it.
#[derive(Default)]
pub struct FakeMediaLibrary {
    fail_writes: bool,
    albums: Mutex<HashMap<String, Vec<Asset>>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicUsize,
}

impl FakeMediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// `create_asset` always fails.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl MediaLibrary for FakeMediaLibrary {
    async fn create_asset(&self, file: &Path) -> Result<Asset, GalleryError> {
        self.record("create_asset");
        if self.fail_writes {
            return Err(GalleryError::WriteFailed("media library unavailable".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(Asset {
            id: format!("asset-{}", id),
            filename: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            uri: file.to_path_buf(),
            created_at_ms: Some(1_700_000_000_000 + id as i64),
            duration_secs: None,
        })
    }

    async fn get_album(&self, name: &str) -> Result<Option<Album>, GalleryError> {
        self.record("get_album");
        Ok(self.albums.lock().unwrap().get(name).map(|_| Album {
            id: name.to_string(),
            title: name.to_string(),
        }))
    }

    async fn create_album(&self, name: &str, asset: &Asset) -> Result<Album, GalleryError> {
        self.record("create_album");
        self.albums
            .lock()
            .unwrap()
            .insert(name.to_string(), vec![asset.clone()]);
        Ok(Album {
            id: name.to_string(),
            title: name.to_string(),
        })
    }

    async fn add_assets_to_album(&self, assets: &[Asset], album: &Album) -> Result<(), GalleryError> {
        self.record("add_assets_to_album");
        self.albums
            .lock()
            .unwrap()
            .entry(album.id.clone())
            .or_default()
            .extend_from_slice(assets);
        Ok(())
    }

    async fn get_assets(&self, album: &Album, first: usize) -> Result<AssetPage, GalleryError> {
        self.record("get_assets");
        let albums = self.albums.lock().unwrap();
        let assets = albums.get(&album.id).cloned().unwrap_or_default();
        Ok(AssetPage {
            total_count: assets.len(),
            assets: assets.into_iter().rev().take(first).collect(),
        })
    }

    async fn delete_assets(&self, assets: &[Asset]) -> Result<(), GalleryError> {
        self.record("delete_assets");
        let mut albums = self.albums.lock().unwrap();
        for album in albums.values_mut() {
            album.retain(|a| !assets.iter().any(|d| d.id == a.id));
        }
        Ok(())
    }
}

pub struct FakeShareSheet {
    available: bool,
    broken: bool,
    shares: AtomicUsize,
    last_options: Mutex<Option<ShareOptions>>,
}

impl FakeShareSheet {
    fn with(available: bool, broken: bool) -> Self {
        Self {
            available,
            broken,
            shares: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    pub fn available() -> Self {
        Self::with(true, false)
    }

    pub fn unavailable() -> Self {
        Self::with(false, false)
    }

    /// Reports itself available, then fails every share.
    pub fn broken() -> Self {
        Self::with(true, true)
    }

    pub fn share_count(&self) -> usize {
        self.shares.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<ShareOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShareSheet for FakeShareSheet {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn share(&self, _file: &Path, options: &ShareOptions) -> Result<(), GalleryError> {
        self.shares.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());
        if self.broken {
            return Err(GalleryError::ShareFailed("share dialog crashed".into()));
        }
        Ok(())
    }
}

/// Plays a fixed script of events: `on_load` right after `load`, `on_show`
/// after `show`. The channel stays open afterwards, like a real ad session.
pub struct FakeAdProvider {
    on_load: Vec<AdEvent>,
    on_show: Vec<AdEvent>,
    sender: Mutex<Option<mpsc::Sender<AdEvent>>>,
    loads: AtomicUsize,
    shows: AtomicUsize,
}

impl FakeAdProvider {
    fn scripted(on_load: Vec<AdEvent>, on_show: Vec<AdEvent>) -> Self {
        Self {
            on_load,
            on_show,
            sender: Mutex::new(None),
            loads: AtomicUsize::new(0),
            shows: AtomicUsize::new(0),
        }
    }

    pub fn rewarding() -> Self {
        Self::scripted(vec![AdEvent::Loaded], vec![AdEvent::EarnedReward, AdEvent::Closed])
    }

    pub fn unavailable() -> Self {
        Self::scripted(vec![AdEvent::FailedToLoad("no fill".into())], vec![])
    }

    pub fn never_loads() -> Self {
        Self::scripted(vec![], vec![])
    }

    /// Loads and shows, but never reports a reward or a close.
    pub fn silent() -> Self {
        Self::scripted(vec![AdEvent::Loaded], vec![])
    }

    pub fn closed_early() -> Self {
        Self::scripted(vec![AdEvent::Loaded], vec![AdEvent::Closed])
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn show_count(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    fn sender(&self) -> Option<mpsc::Sender<AdEvent>> {
        self.sender.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdProvider for FakeAdProvider {
    async fn load(&self, _kind: AdKind) -> Result<mpsc::Receiver<AdEvent>, AdError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(8);
        for event in &self.on_load {
            let _ = tx.send(event.clone()).await;
        }
        *self.sender.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn show(&self, _kind: AdKind) -> Result<(), AdError> {
        self.shows.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self.sender() {
            for event in &self.on_show {
                let _ = tx.send(event.clone()).await;
            }
        }
        Ok(())
    }
}
