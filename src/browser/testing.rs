//! In-memory browsing sessions serving fixed HTML per URL.

use super::{BrowserSession, SessionProvider};
use crate::error::FetchError;
use crate::scraper::parsers::Document;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    visited: Mutex<Vec<String>>,
}

#[derive(Default)]
pub struct StaticProvider {
    pages: Arc<HashMap<String, String>>,
    counters: Arc<Counters>,
    fail_open: bool,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), html.to_string());
        self
    }

    /// Every `open()` fails, as when no browser is installed.
    pub fn unavailable() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.counters.visited.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SessionProvider for StaticProvider {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, FetchError> {
        if self.fail_open {
            return Err(FetchError::Launch("no browser in test".into()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticSession {
            pages: Arc::clone(&self.pages),
            counters: Arc::clone(&self.counters),
            current: None,
        }))
    }
}

pub struct StaticSession {
    pages: Arc<HashMap<String, String>>,
    counters: Arc<Counters>,
    current: Option<String>,
}

fn has_element(html: &str, locator: &str) -> bool {
    Document::parse(html).query(locator).is_some()
}

#[async_trait]
impl BrowserSession for StaticSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), FetchError> {
        if let Ok(mut v) = self.counters.visited.lock() {
            v.push(url.to_string());
        }
        match self.pages.get(url) {
            Some(html) => {
                self.current = Some(html.clone());
                Ok(())
            }
            None => Err(FetchError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".into(),
            }),
        }
    }

    async fn wait_for(&mut self, locator: &str, _timeout: Duration) -> Result<bool, FetchError> {
        Ok(self
            .current
            .as_deref()
            .is_some_and(|html| has_element(html, locator)))
    }

    async fn content(&mut self) -> Result<String, FetchError> {
        self.current
            .clone()
            .ok_or_else(|| FetchError::Content("no page loaded".into()))
    }

    async fn close(self: Box<Self>) -> Result<(), FetchError> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
