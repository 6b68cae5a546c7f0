mod rewarded;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::mpsc;

pub use rewarded::{CancelReason, GateContext, GateOutcome, GateState, RewardedAdGate};

use crate::storage::{CacheManager, CacheOptions, CacheType, StorageError};

pub const LAST_AD_KEY: &str = "last_ad_shown_at";

#[derive(Debug, thiserror::Error)]
pub enum AdError {
    #[error("ad failed to load: {0}")]
    LoadFailed(String),
    #[error("ad could not be shown: {0}")]
    ShowFailed(String),
    #[error("invalid ad gate transition from {from:?} to {to:?}")]
    InvalidTransition { from: GateState, to: GateState },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdKind {
    Rewarded,
    AppOpen,
}

/// Lifecycle events reported by the ad SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdEvent {
    Loaded,
    FailedToLoad(String),
    EarnedReward,
    Closed,
}

#[async_trait]
pub trait AdProvider: Send + Sync {
    /// Starts loading an ad of `kind`. Every event of that ad, including the
    /// ones caused by [`AdProvider::show`], arrives on the returned channel.
    async fn load(&self, kind: AdKind) -> Result<mpsc::Receiver<AdEvent>, AdError>;
    async fn show(&self, kind: AdKind) -> Result<(), AdError>;
}

/// Provider for builds without an ad SDK: every load fails right away.
#[derive(Debug, Clone, Default)]
pub struct NoAds;

#[async_trait]
impl AdProvider for NoAds {
    async fn load(&self, _kind: AdKind) -> Result<mpsc::Receiver<AdEvent>, AdError> {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.send(AdEvent::FailedToLoad("no ad provider".into())).await;
        Ok(rx)
    }

    async fn show(&self, _kind: AdKind) -> Result<(), AdError> {
        Err(AdError::ShowFailed("no ad provider".into()))
    }
}

/// Persisted "last ad shown" timestamp checked against a cooldown window.
#[derive(Clone)]
pub struct AdCooldown {
    cache: CacheManager,
    cooldown: Duration,
}

impl AdCooldown {
    pub fn new(cache: CacheManager, cooldown: Duration) -> Self {
        info!("Initializing AdCooldown with {}s window", cooldown.as_secs());
        Self { cache, cooldown }
    }

    fn cache_options() -> CacheOptions {
        CacheOptions {
            cache_type: CacheType::Both,
            prefix: None,
        }
    }

    pub async fn last_shown(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let raw = self.cache.get_raw(LAST_AD_KEY, &Self::cache_options()).await?;
        Ok(raw
            .and_then(|value| value.trim().parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis))
    }

    pub async fn should_show(&self) -> bool {
        self.should_show_at(Utc::now()).await
    }

    /// True when no ad was ever recorded or the cooldown has elapsed. A store
    /// that cannot be read does not block ads.
    pub async fn should_show_at(&self, now: DateTime<Utc>) -> bool {
        let last = match self.last_shown().await {
            Ok(Some(last)) => last,
            Ok(None) => return true,
            Err(e) => {
                warn!("Failed to read ad timestamp: {}", e);
                return true;
            }
        };

        let window = TimeDelta::from_std(self.cooldown).unwrap_or(TimeDelta::MAX);
        let elapsed = now.signed_duration_since(last);
        debug!("Last ad shown {}s ago", elapsed.num_seconds());
        elapsed >= window
    }

    pub async fn record_shown(&self) -> Result<(), AdError> {
        self.record_shown_at(Utc::now()).await
    }

    pub async fn record_shown_at(&self, now: DateTime<Utc>) -> Result<(), AdError> {
        self.cache
            .set_raw(LAST_AD_KEY, &now.timestamp_millis().to_string(), &Self::cache_options())
            .await?;
        Ok(())
    }
}

/// Shows an app-open ad when the app comes to the foreground, at most once per
/// cooldown window.
#[derive(Clone)]
pub struct AppOpenAdService {
    provider: Arc<dyn AdProvider>,
    cooldown: AdCooldown,
    load_timeout: Duration,
}

impl AppOpenAdService {
    pub fn new(provider: Arc<dyn AdProvider>, cooldown: AdCooldown, load_timeout: Duration) -> Self {
        Self {
            provider,
            cooldown,
            load_timeout,
        }
    }

    /// Returns whether an ad was shown.
    pub async fn on_foreground(&self) -> Result<bool, AdError> {
        if !self.cooldown.should_show().await {
            debug!("App-open ad skipped, cooldown active");
            return Ok(false);
        }

        let mut events = self.provider.load(AdKind::AppOpen).await?;
        let loaded = tokio::time::timeout(self.load_timeout, async {
            while let Some(event) = events.recv().await {
                match event {
                    AdEvent::Loaded => return true,
                    AdEvent::FailedToLoad(reason) => {
                        info!("App-open ad failed to load: {}", reason);
                        return false;
                    }
                    _ => {}
                }
            }
            false
        })
        .await
        .unwrap_or(false);

        if !loaded {
            return Ok(false);
        }

        self.provider.show(AdKind::AppOpen).await?;
        self.cooldown.record_shown().await?;
        info!("App-open ad shown");
        Ok(true)
    }
}
