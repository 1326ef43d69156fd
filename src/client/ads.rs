//! Ad gating in front of story generation.
//!
//! A rewarded ad is preferred. Repeated "no fill" answers are retried on a
//! fixed schedule, then an interstitial is tried, and if neither loads the
//! user proceeds without an ad. Ads never block generation for long.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::RetryIf;
use tracing::{info, warn};

const NO_FILL_RETRY_DELAYS_MS: [u64; 3] = [1_000, 3_000, 5_000];
const AD_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdKind {
    Rewarded,
    Interstitial,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdError {
    #[error("No ad to show")]
    NoFill,

    #[error("Ads are not supported on this device")]
    Unsupported,

    #[error("Ad error: {0}")]
    Other(String),
}

/// How a shown ad ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    Dismissed { reward_earned: bool },
    FailedToShow,
}

/// Result of gating a submission behind an ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdOutcome {
    /// Watched to the end, or no ad could be shown.
    Completed,
    /// A rewarded ad was closed before the reward.
    Skipped,
}

/// The ad SDK boundary.
#[async_trait]
pub trait AdNetwork: Send + Sync {
    async fn load(&self, kind: AdKind) -> Result<(), AdError>;
    async fn show(&self, kind: AdKind) -> Result<ShowOutcome, AdError>;
}

/// A network with no ads; every submission proceeds without one.
pub struct NoAds;

#[async_trait]
impl AdNetwork for NoAds {
    async fn load(&self, _kind: AdKind) -> Result<(), AdError> {
        Err(AdError::Unsupported)
    }

    async fn show(&self, _kind: AdKind) -> Result<ShowOutcome, AdError> {
        Err(AdError::Unsupported)
    }
}

pub struct AdCoordinator {
    network: Arc<dyn AdNetwork>,
    loaded: Option<AdKind>,
    retry_delays: Vec<Duration>,
    wait_timeout: Duration,
}

impl AdCoordinator {
    pub fn new(network: Arc<dyn AdNetwork>) -> Self {
        Self {
            network,
            loaded: None,
            retry_delays: NO_FILL_RETRY_DELAYS_MS
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
            wait_timeout: AD_WAIT_TIMEOUT,
        }
    }

    pub fn loaded(&self) -> Option<AdKind> {
        self.loaded
    }

    /// Load an ad ahead of the next submission.
    pub async fn preload(&mut self) -> Option<AdKind> {
        self.loaded = load_any(self.network.as_ref(), &self.retry_delays).await;
        self.loaded
    }

    /// Show an ad before generation.
    ///
    /// Uses the preloaded ad if there is one, otherwise waits up to ten
    /// seconds for one to load. Anything that prevents showing an ad counts
    /// as completed.
    pub async fn request_ad(&mut self) -> AdOutcome {
        let kind = match self.loaded.take() {
            Some(kind) => Some(kind),
            None => {
                info!("No ad loaded yet, waiting for one");
                let load = load_any(self.network.as_ref(), &self.retry_delays);
                match tokio::time::timeout(self.wait_timeout, load).await {
                    Ok(kind) => kind,
                    Err(_) => {
                        warn!(
                            "Ad did not load within {:?}, proceeding without one",
                            self.wait_timeout
                        );
                        None
                    }
                }
            }
        };

        match kind {
            Some(kind) => self.show(kind).await,
            None => AdOutcome::Completed,
        }
    }

    async fn show(&self, kind: AdKind) -> AdOutcome {
        match self.network.show(kind).await {
            Ok(ShowOutcome::Dismissed { reward_earned }) => {
                if kind == AdKind::Rewarded && !reward_earned {
                    warn!("Rewarded ad closed before the reward");
                    AdOutcome::Skipped
                } else {
                    AdOutcome::Completed
                }
            }
            Ok(ShowOutcome::FailedToShow) => {
                warn!("{:?} ad failed to show, proceeding without one", kind);
                AdOutcome::Completed
            }
            Err(e) => {
                warn!("{:?} ad could not be shown ({}), proceeding without one", kind, e);
                AdOutcome::Completed
            }
        }
    }
}

/// Rewarded first, then interstitial, each retried on "no fill".
async fn load_any(network: &dyn AdNetwork, retry_delays: &[Duration]) -> Option<AdKind> {
    for kind in [AdKind::Rewarded, AdKind::Interstitial] {
        match load_with_retries(network, kind, retry_delays).await {
            Ok(()) => {
                info!("{:?} ad loaded", kind);
                return Some(kind);
            }
            Err(e) => warn!("{:?} ad failed to load: {}", kind, e),
        }
    }
    warn!("No ad available, proceeding without one");
    None
}

async fn load_with_retries(
    network: &dyn AdNetwork,
    kind: AdKind,
    retry_delays: &[Duration],
) -> Result<(), AdError> {
    RetryIf::spawn(
        retry_delays.to_vec(),
        || network.load(kind),
        |e: &AdError| *e == AdError::NoFill,
    )
    .await
}
