use std::sync::{Arc, OnceLock};

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    service::{
        ad::NoAds,
        device::{DesktopNetwork, DesktopPermissions},
        gallery::{FsMediaLibrary, NoShareSheet},
        http::HttpService,
        Collaborators, ServiceRegistry,
    },
    storage::FileStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: ServiceRegistry,
}

static APP_STATE: OnceLock<AppState> = OnceLock::new();

impl AppState {
    pub async fn new(config: AppConfig, deps: Collaborators) -> Self {
        let services = ServiceRegistry::new(&config, deps).await;
        Self { config, services }
    }

    /// Collaborators for a desktop build: files for storage and gallery, the
    /// configured connection type, no permission prompts, share sheet or ads.
    pub async fn desktop_collaborators(config: &AppConfig) -> AppResult<Collaborators> {
        let store = FileStore::new(&config.storage.data_dir).await?;
        let http = HttpService::new(&config.api)?;

        Ok(Collaborators {
            http: Arc::new(http),
            store: Arc::new(store),
            network: Arc::new(DesktopNetwork::new(config.device.connection)),
            permissions: Arc::new(DesktopPermissions),
            library: Arc::new(FsMediaLibrary::new(&config.gallery.root)),
            share_sheet: Arc::new(NoShareSheet),
            ads: Arc::new(NoAds),
        })
    }

    pub async fn init(config: AppConfig) -> AppResult<()> {
        info!("Initializing AppState...");
        let deps = Self::desktop_collaborators(&config).await?;
        let state = Self::new(config, deps).await;
        Self::set_global(state)?;
        info!("AppState initialized");
        Ok(())
    }

    pub fn set_global(state: AppState) -> AppResult<()> {
        APP_STATE
            .set(state)
            .map_err(|_| AppError::AppState("Failed to set global app state".into()))
    }

    pub fn get() -> AppResult<AppState> {
        APP_STATE
            .get()
            .cloned()
            .ok_or_else(|| AppError::AppState("App state not initialized".into()))
    }
}
