pub mod cleaner;
pub mod currency;
pub mod http_client;
pub mod parsers;
pub mod resolver;

use crate::browser::{BrowserSession, Readiness};
use crate::models::{RawFields, SourceId};
use crate::sources::SourceAdapter;
use async_trait::async_trait;
use std::sync::Arc;

use self::parsers::{Document, extract_fields};
use self::resolver::{LinkResolution, LinkResolver};

// ── Source trait ──────────────────────────────────────────────────────────────

/// One storefront, as seen by the pipeline.
#[async_trait]
pub trait PharmacySource: Send + Sync {
    fn id(&self) -> SourceId;
    fn readiness(&self) -> Readiness;
    async fn resolve_link(&self, session: &mut dyn BrowserSession, query: &str) -> LinkResolution;
    fn extract_fields(&self, doc: &Document) -> RawFields;
}

// ── Adapter-driven source ─────────────────────────────────────────────────────

/// A storefront described entirely by a [`SourceAdapter`].
pub struct ConfiguredSource {
    adapter: &'static SourceAdapter,
    resolver: Arc<LinkResolver>,
}

impl ConfiguredSource {
    pub fn new(adapter: &'static SourceAdapter, resolver: Arc<LinkResolver>) -> Self {
        Self { adapter, resolver }
    }
}

#[async_trait]
impl PharmacySource for ConfiguredSource {
    fn id(&self) -> SourceId {
        self.adapter.id
    }

    fn readiness(&self) -> Readiness {
        self.adapter.readiness
    }

    async fn resolve_link(&self, session: &mut dyn BrowserSession, query: &str) -> LinkResolution {
        self.resolver.resolve(session, self.adapter, query).await
    }

    fn extract_fields(&self, doc: &Document) -> RawFields {
        extract_fields(doc, &self.adapter.fields)
    }
}

/// Extract from raw HTML. Keeps the parsed tree out of async state.
pub fn extract_from_html(source: &dyn PharmacySource, html: &str) -> RawFields {
    let doc = Document::parse(html);
    source.extract_fields(&doc)
}
