use std::str::FromStr;

pub use model::{FirstRunPolicy, Language, StartupRoute};

use crate::storage::{CacheManager, CacheOptions, CacheType, StorageError};

mod model;

pub const LANGUAGE_KEY: &str = "app_language";

#[derive(Clone)]
pub struct LanguageService {
    cache: CacheManager,
    first_run: FirstRunPolicy,
}

impl LanguageService {
    pub fn new(cache: CacheManager, first_run: FirstRunPolicy) -> Self {
        info!("Initializing LanguageService with first run policy {:?}", first_run);
        Self { cache, first_run }
    }

    fn cache_options() -> CacheOptions {
        CacheOptions {
            cache_type: CacheType::Both,
            prefix: None,
        }
    }

    /// The stored choice, `None` when the user never picked one. Unreadable or
    /// unknown values count as never picked.
    pub async fn get_language(&self) -> Option<Language> {
        match self.cache.get_raw(LANGUAGE_KEY, &Self::cache_options()).await {
            Ok(Some(code)) => Language::from_str(&code)
                .inspect_err(|e| warn!("Ignoring stored language: {}", e))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read language preference: {}", e);
                None
            }
        }
    }

    pub async fn set_language(&self, language: Language) -> Result<(), StorageError> {
        info!("Setting language to {}", language);
        self.cache
            .set_raw(LANGUAGE_KEY, language.code(), &Self::cache_options())
            .await
    }

    pub async fn current(&self) -> Language {
        self.get_language().await.unwrap_or_default()
    }

    pub async fn startup_route(&self) -> StartupRoute {
        match (self.get_language().await, self.first_run) {
            (Some(language), _) => StartupRoute::Home(language),
            (None, FirstRunPolicy::Prompt) => StartupRoute::LanguageSelection,
            (None, FirstRunPolicy::DefaultEnglish) => StartupRoute::Home(Language::English),
        }
    }

    pub fn supported(&self) -> &'static [Language] {
        &Language::ALL
    }
}
