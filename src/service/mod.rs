use std::sync::Arc;

use crate::{
    config::AppConfig,
    storage::{CacheManager, KeyValueStore},
};

pub mod ad;
pub mod device;
pub mod download;
pub mod gallery;
pub mod http;
pub mod language;
pub mod metadata;
pub mod settings;

use ad::{AdCooldown, AdProvider, AppOpenAdService, RewardedAdGate};
use device::{NetworkProbe, PermissionProvider};
use download::DownloadService;
use gallery::{GalleryService, MediaLibrary, ShareSheet};
use http::HttpClient;
use language::LanguageService;
use metadata::MetadataService;
use settings::SettingsService;

pub use ad::AdError;
pub use download::DownloadError;
pub use gallery::GalleryError;
pub use language::Language;
pub use metadata::MetadataError;

const CACHE_CAPACITY: usize = 16;

/// Everything outside the process the services talk to.
#[derive(Clone)]
pub struct Collaborators {
    pub http: Arc<dyn HttpClient>,
    pub store: Arc<dyn KeyValueStore>,
    pub network: Arc<dyn NetworkProbe>,
    pub permissions: Arc<dyn PermissionProvider>,
    pub library: Arc<dyn MediaLibrary>,
    pub share_sheet: Arc<dyn ShareSheet>,
    pub ads: Arc<dyn AdProvider>,
}

#[derive(Clone)]
pub struct ServiceRegistry {
    pub settings: SettingsService,
    pub language: LanguageService,
    pub metadata: MetadataService,
    pub gallery: GalleryService,
    pub download: DownloadService,
    pub cooldown: AdCooldown,
    pub app_open_ad: AppOpenAdService,
    pub rewarded_gate: RewardedAdGate,
}

impl ServiceRegistry {
    pub async fn new(config: &AppConfig, deps: Collaborators) -> Self {
        info!("Initializing service registry");

        let cache = CacheManager::new(Arc::clone(&deps.store), CACHE_CAPACITY);

        let settings = SettingsService::new(Arc::clone(&deps.store));
        settings.load().await;

        let language = LanguageService::new(cache.clone(), config.language.first_run);

        let metadata = MetadataService::new(Arc::clone(&deps.http), config.api.base_url.clone());

        let gallery = GalleryService::new(
            deps.library,
            deps.share_sheet,
            config.gallery.album_name.clone(),
            config.gallery.page_size,
        );

        let download = DownloadService::new(
            deps.http,
            deps.network,
            deps.permissions,
            settings.clone(),
            gallery.clone(),
            config.api.base_url.clone(),
            config.storage.temp_dir.clone(),
        );

        let cooldown = AdCooldown::new(cache, config.ad.cooldown);
        let app_open_ad = AppOpenAdService::new(Arc::clone(&deps.ads), cooldown.clone(), config.ad.reward_timeout);
        let rewarded_gate = RewardedAdGate::new(deps.ads, config.ad.reward_timeout);

        info!("Service registry initialized");

        Self {
            settings,
            language,
            metadata,
            gallery,
            download,
            cooldown,
            app_open_ad,
            rewarded_gate,
        }
    }
}
