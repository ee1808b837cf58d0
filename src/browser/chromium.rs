//! Chromium-backed sessions using chromiumoxide.

use super::{BrowserSession, SessionProvider};
use crate::config::BrowserSettings;
use crate::error::FetchError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches one headless Chromium per session.
pub struct ChromiumProvider {
    settings: BrowserSettings,
}

impl ChromiumProvider {
    pub fn new(settings: &BrowserSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, FetchError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.settings.navigation_timeout())
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");

        if !self.settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.settings.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(FetchError::Launch)
    }
}

#[async_trait]
impl SessionProvider for ChromiumProvider {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, FetchError> {
        let config = self.browser_config()?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler: {}", e);
                }
            }
        });

        let mut session = ChromiumSession {
            browser,
            page: None,
            handler,
        };

        match session.browser.new_page("about:blank").await {
            Ok(page) => {
                session.page = Some(page);
                Ok(Box::new(session))
            }
            Err(e) => {
                let _ = Box::new(session).close().await;
                Err(FetchError::Launch(format!("failed to open tab: {e}")))
            }
        }
    }
}

pub struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, FetchError> {
        self.page
            .as_ref()
            .ok_or_else(|| FetchError::Content("session has no open tab".into()))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), FetchError> {
        let page = self.page()?;
        debug!("Navigating to {}", url);

        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(FetchError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn wait_for(&mut self, locator: &str, timeout: Duration) -> Result<bool, FetchError> {
        let page = self.page()?;
        let appeared = tokio::time::timeout(timeout, async {
            loop {
                if page.find_element(locator).await.is_ok() {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await
        .is_ok();
        Ok(appeared)
    }

    async fn content(&mut self) -> Result<String, FetchError> {
        self.page()?
            .content()
            .await
            .map_err(|e| FetchError::Content(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), FetchError> {
        let mut this = self;
        if let Some(page) = this.page.take() {
            if let Err(e) = page.close().await {
                debug!("Closing tab: {}", e);
            }
        }
        if let Err(e) = this.browser.close().await {
            warn!("Closing browser: {}", e);
        }
        let _ = this.browser.wait().await;
        this.handler.abort();
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
