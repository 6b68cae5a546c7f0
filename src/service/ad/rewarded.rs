use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{AdError, AdEvent, AdKind, AdProvider};

/// States of the rewarded-ad-before-download gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    PendingDownload,
    AdShown,
    RewardEarned,
    AdUnavailable,
    Downloading,
    Cancelled,
}

impl GateState {
    fn can_advance_to(self, next: GateState) -> bool {
        use GateState::*;

        matches!(
            (self, next),
            (Idle, PendingDownload)
                | (PendingDownload, AdShown)
                | (PendingDownload, AdUnavailable)
                | (AdShown, RewardEarned)
                | (RewardEarned, Downloading)
                | (AdUnavailable, Downloading)
                | (PendingDownload, Cancelled)
                | (AdShown, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GateState::Downloading | GateState::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The screen that asked for the download went away.
    UserLeft,
    /// The ad was shown but no reward arrived before the deadline.
    Timeout,
    /// The ad was closed without earning the reward.
    ClosedWithoutReward,
}

/// The download waiting behind the gate, with the state it has reached.
#[derive(Debug)]
pub struct GateContext<T> {
    pending: T,
    state: GateState,
    history: Vec<GateState>,
}

impl<T> GateContext<T> {
    pub fn new(pending: T) -> Self {
        Self {
            pending,
            state: GateState::Idle,
            history: vec![GateState::Idle],
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn history(&self) -> &[GateState] {
        &self.history
    }

    pub fn pending(&self) -> &T {
        &self.pending
    }

    pub fn advance(&mut self, next: GateState) -> Result<(), AdError> {
        if !self.state.can_advance_to(next) {
            return Err(AdError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!("Rewarded gate {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    fn into_outcome(self, cancelled: Option<CancelReason>) -> GateOutcome<T> {
        match cancelled {
            None => GateOutcome::Download {
                pending: self.pending,
                history: self.history,
            },
            Some(reason) => GateOutcome::Cancelled {
                reason,
                history: self.history,
            },
        }
    }
}

#[derive(Debug)]
pub enum GateOutcome<T> {
    /// The gate reached `Downloading`, the pending download should start now.
    Download { pending: T, history: Vec<GateState> },
    Cancelled { reason: CancelReason, history: Vec<GateState> },
}

impl<T> GateOutcome<T> {
    pub fn history(&self) -> &[GateState] {
        match self {
            GateOutcome::Download { history, .. } | GateOutcome::Cancelled { history, .. } => history,
        }
    }
}

/// Runs one rewarded ad before a download. No ad (load failure, no fill or a
/// load that outlasts the deadline) lets the download through; a shown ad
/// only does once the reward arrives.
#[derive(Clone)]
pub struct RewardedAdGate {
    provider: Arc<dyn AdProvider>,
    reward_timeout: Duration,
}

impl RewardedAdGate {
    pub fn new(provider: Arc<dyn AdProvider>, reward_timeout: Duration) -> Self {
        Self {
            provider,
            reward_timeout,
        }
    }

    pub async fn run<T>(&self, pending: T, cancel: &CancellationToken) -> Result<GateOutcome<T>, AdError> {
        let mut ctx = GateContext::new(pending);
        ctx.advance(GateState::PendingDownload)?;

        let mut events = match self.provider.load(AdKind::Rewarded).await {
            Ok(events) => events,
            Err(e) => {
                warn!("Rewarded ad request failed: {}", e);
                return Self::skip_ad(ctx);
            }
        };

        let loaded = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Self::cancel(ctx, CancelReason::UserLeft),
            loaded = tokio::time::timeout(self.reward_timeout, wait_for_load(&mut events)) => loaded.unwrap_or(false),
        };
        if !loaded {
            return Self::skip_ad(ctx);
        }

        if let Err(e) = self.provider.show(AdKind::Rewarded).await {
            warn!("Rewarded ad could not be shown: {}", e);
            return Self::skip_ad(ctx);
        }
        ctx.advance(GateState::AdShown)?;

        let deadline = tokio::time::sleep(self.reward_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Self::cancel(ctx, CancelReason::UserLeft),
                _ = &mut deadline => {
                    warn!("No reward within {}s, dropping pending download", self.reward_timeout.as_secs());
                    return Self::cancel(ctx, CancelReason::Timeout);
                }
                event = events.recv() => match event {
                    Some(AdEvent::EarnedReward) => {
                        info!("Reward earned, starting download");
                        ctx.advance(GateState::RewardEarned)?;
                        ctx.advance(GateState::Downloading)?;
                        return Ok(ctx.into_outcome(None));
                    }
                    Some(AdEvent::Closed) | None => {
                        return Self::cancel(ctx, CancelReason::ClosedWithoutReward);
                    }
                    Some(other) => debug!("Ignoring ad event {:?}", other),
                },
            }
        }
    }

    fn skip_ad<T>(mut ctx: GateContext<T>) -> Result<GateOutcome<T>, AdError> {
        info!("Rewarded ad unavailable, downloading directly");
        ctx.advance(GateState::AdUnavailable)?;
        ctx.advance(GateState::Downloading)?;
        Ok(ctx.into_outcome(None))
    }

    fn cancel<T>(mut ctx: GateContext<T>, reason: CancelReason) -> Result<GateOutcome<T>, AdError> {
        info!("Rewarded gate cancelled: {:?}", reason);
        ctx.advance(GateState::Cancelled)?;
        Ok(ctx.into_outcome(Some(reason)))
    }
}

async fn wait_for_load(events: &mut mpsc::Receiver<AdEvent>) -> bool {
    while let Some(event) = events.recv().await {
        match event {
            AdEvent::Loaded => return true,
            AdEvent::FailedToLoad(reason) => {
                info!("Rewarded ad failed to load: {}", reason);
                return false;
            }
            other => debug!("Ignoring ad event {:?} before load", other),
        }
    }
    false
}
