//! Headless browsing sessions and the page fetch adapter.
//!
//! A session is opened per resolution, used for at most one search and one
//! product navigation, and closed by the caller on every exit path.

pub mod chromium;
#[cfg(test)]
pub mod testing;

use crate::config::BrowserSettings;
use crate::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Opens headless browsing sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, FetchError>;
}

/// A single headless tab.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait for load, bounded by `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), FetchError>;
    /// Wait for `locator` to appear. `Ok(false)` when the bound elapsed first.
    async fn wait_for(&mut self, locator: &str, timeout: Duration) -> Result<bool, FetchError>;
    /// Serialized DOM of the current page.
    async fn content(&mut self) -> Result<String, FetchError>;
    async fn close(self: Box<Self>) -> Result<(), FetchError>;
}

/// How to decide a freshly navigated page is ready to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Wait (bounded) for this element; proceed either way.
    Marker(&'static str),
    /// Sleep for the fixed settle delay.
    Settle,
}

/// Timeouts applied to every page fetch.
#[derive(Debug, Clone, Copy)]
pub struct FetchTiming {
    pub navigation: Duration,
    pub ready: Duration,
    pub settle: Duration,
}

impl From<&BrowserSettings> for FetchTiming {
    fn from(s: &BrowserSettings) -> Self {
        Self {
            navigation: s.navigation_timeout(),
            ready: s.ready_timeout(),
            settle: s.settle_delay(),
        }
    }
}

/// Rendered HTML of one page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

/// Sleep for the settle delay, if any.
pub async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Navigate to `url`, wait for readiness (best effort) and read the page.
pub async fn fetch_page(
    session: &mut dyn BrowserSession,
    url: &str,
    readiness: Readiness,
    timing: &FetchTiming,
) -> Result<RenderedPage, FetchError> {
    session.navigate(url, timing.navigation).await?;

    match readiness {
        Readiness::Marker(marker) => match session.wait_for(marker, timing.ready).await {
            Ok(true) => debug!("Ready marker {:?} present on {}", marker, url),
            Ok(false) => warn!("Ready marker {:?} did not appear on {} in time", marker, url),
            Err(e) => warn!("Waiting for {:?} on {} failed: {}", marker, url, e),
        },
        Readiness::Settle => settle(timing.settle).await,
    }

    let html = session.content().await?;
    debug!("Fetched {} ({} bytes)", url, html.len());

    Ok(RenderedPage {
        url: url.to_string(),
        html,
    })
}
