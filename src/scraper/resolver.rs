//! Link resolution: query → canonical product URL, or a typed not-found.

use crate::browser::{BrowserSession, settle};
use crate::models::{NotFoundReason, SearchHit};
use crate::scraper::http_client::SearchIndex;
use crate::scraper::parsers::Document;
use crate::sources::{SearchStrategy, SourceAdapter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkResolution {
    Found(String),
    NotFound(NotFoundReason),
}

pub struct LinkResolver {
    index: Option<Arc<dyn SearchIndex>>,
    navigation_timeout: Duration,
    settle: Duration,
}

impl LinkResolver {
    pub fn new(
        index: Option<Arc<dyn SearchIndex>>,
        navigation_timeout: Duration,
        settle: Duration,
    ) -> Self {
        Self {
            index,
            navigation_timeout,
            settle,
        }
    }

    /// Whether `strategy` can run with this resolver's collaborators.
    pub fn can_run(&self, strategy: &SearchStrategy) -> bool {
        match strategy {
            SearchStrategy::SearchIndex { .. } => self.index.is_some(),
            SearchStrategy::OnSite { .. } => true,
        }
    }

    /// The strategy that `resolve` will use for `adapter`.
    pub fn active_strategy(&self, adapter: &SourceAdapter) -> Option<SearchStrategy> {
        adapter.search.iter().copied().find(|s| self.can_run(s))
    }

    pub async fn resolve(
        &self,
        session: &mut dyn BrowserSession,
        adapter: &SourceAdapter,
        query: &str,
    ) -> LinkResolution {
        let Some(strategy) = self.active_strategy(adapter) else {
            warn!("{}: no link strategy available (search index not configured)", adapter.id);
            return LinkResolution::NotFound(NotFoundReason::NoStrategy);
        };

        let resolution = match strategy {
            SearchStrategy::SearchIndex { domain } => match &self.index {
                Some(index) => self.via_index(index.as_ref(), adapter, domain, query).await,
                None => LinkResolution::NotFound(NotFoundReason::NoStrategy),
            },
            SearchStrategy::OnSite {
                search_url,
                query_param,
            } => {
                self.via_site_search(session, adapter, search_url, query_param, query)
                    .await
            }
        };

        match &resolution {
            LinkResolution::Found(link) => info!("{}: product link {}", adapter.id, link),
            LinkResolution::NotFound(reason) => {
                warn!("{}: no product for {:?} ({})", adapter.id, query, reason)
            }
        }
        resolution
    }

    async fn via_index(
        &self,
        index: &dyn SearchIndex,
        adapter: &SourceAdapter,
        domain: &str,
        query: &str,
    ) -> LinkResolution {
        let scoped = format!("{} site:{}", query.trim(), domain);
        match index.search(&scoped).await {
            Ok(hits) => match first_matching_hit(&hits, adapter) {
                Some(hit) => LinkResolution::Found(hit.url.clone()),
                None => LinkResolution::NotFound(NotFoundReason::NoMatch),
            },
            Err(e) => {
                warn!("{}: search index error: {}", adapter.id, e);
                LinkResolution::NotFound(NotFoundReason::SearchFailed)
            }
        }
    }

    async fn via_site_search(
        &self,
        session: &mut dyn BrowserSession,
        adapter: &SourceAdapter,
        search_url: &str,
        query_param: &str,
        query: &str,
    ) -> LinkResolution {
        let url = match Url::parse_with_params(search_url, &[(query_param, query.trim())]) {
            Ok(u) => u,
            Err(e) => {
                warn!("{}: bad search URL {:?}: {}", adapter.id, search_url, e);
                return LinkResolution::NotFound(NotFoundReason::NoMatch);
            }
        };

        debug!("{}: on-site search {}", adapter.id, url);
        if let Err(e) = session.navigate(url.as_str(), self.navigation_timeout).await {
            warn!("{}: search page failed: {}", adapter.id, e);
            return LinkResolution::NotFound(NotFoundReason::NoMatch);
        }
        settle(self.settle).await;

        let html = match session.content().await {
            Ok(h) => h,
            Err(e) => {
                warn!("{}: search page unreadable: {}", adapter.id, e);
                return LinkResolution::NotFound(NotFoundReason::NoMatch);
            }
        };

        match first_matching_anchor(&html, adapter) {
            Some(link) => LinkResolution::Found(link),
            None => LinkResolution::NotFound(NotFoundReason::NoMatch),
        }
    }
}

/// First index hit, in rank order, that matches the product pattern.
pub fn first_matching_hit<'a>(
    hits: &'a [SearchHit],
    adapter: &SourceAdapter,
) -> Option<&'a SearchHit> {
    hits.iter().find(|h| adapter.accepts(&h.url))
}

/// First anchor, in document order, whose href matches the product pattern,
/// made absolute against the adapter's origin.
pub fn first_matching_anchor(html: &str, adapter: &SourceAdapter) -> Option<String> {
    let doc = Document::parse(html);
    let origin = Url::parse(adapter.origin).ok()?;

    doc.anchor_hrefs()
        .into_iter()
        .filter(|href| adapter.accepts(href))
        .find_map(|href| origin.join(href.trim()).ok())
        .map(|u| u.to_string())
}
