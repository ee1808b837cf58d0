//! Quote pipeline: ties link resolution → page fetch → extraction → normalization.
//!
//! ## Run modes
//!
//! `quote()`: one (source, query) resolution inside one browsing session.
//!   The session is opened first and closed before returning, whatever the
//!   outcome. Every failure degrades to a not-found record or absent fields.
//!
//! `compare()`: one `quote()` per source for the same query, run
//!   concurrently, each with its own session.

use crate::browser::{FetchTiming, SessionProvider, fetch_page};
use crate::models::{NotFound, NotFoundReason, Quote, QuoteOutcome, RawFields};
use crate::scraper::cleaner::normalize;
use crate::scraper::resolver::LinkResolution;
use crate::scraper::{PharmacySource, extract_from_html};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

pub struct QuotePipeline {
    browser: Arc<dyn SessionProvider>,
    timing: FetchTiming,
}

impl QuotePipeline {
    pub fn new(browser: Arc<dyn SessionProvider>, timing: FetchTiming) -> Self {
        Self { browser, timing }
    }

    pub async fn quote(&self, source: &dyn PharmacySource, query: &str) -> QuoteOutcome {
        let mut session = match self.browser.open().await {
            Ok(s) => s,
            Err(e) => {
                warn!("{}: could not open browser session: {}", source.id(), e);
                return QuoteOutcome::NotFound(NotFound::new(
                    source.id(),
                    query,
                    NotFoundReason::BrowserUnavailable,
                ));
            }
        };

        let link = match source.resolve_link(session.as_mut(), query).await {
            LinkResolution::Found(link) => link,
            LinkResolution::NotFound(reason) => {
                if let Err(e) = session.close().await {
                    warn!("{}: closing session: {}", source.id(), e);
                }
                return QuoteOutcome::NotFound(NotFound::new(source.id(), query, reason));
            }
        };

        let fetched = fetch_page(session.as_mut(), &link, source.readiness(), &self.timing).await;
        let raw = match fetched {
            Ok(page) => extract_from_html(source, &page.html),
            Err(e) => {
                warn!("{}: product page unavailable, fields left empty: {}", source.id(), e);
                RawFields::default()
            }
        };

        if let Err(e) = session.close().await {
            warn!("{}: closing session: {}", source.id(), e);
        }

        let quote = normalize(source.id(), &link, raw);
        info!(
            "{}: {:?} price={:?} mrp={:?} discount={}%",
            quote.pharmacy, quote.name, quote.price, quote.mrp, quote.discount_percent
        );
        QuoteOutcome::Found(quote)
    }

    /// Resolve `query` against every source, at most `concurrency` at a time.
    /// Outcomes keep the order of `sources`.
    pub async fn compare(
        self: &Arc<Self>,
        sources: &[Arc<dyn PharmacySource>],
        query: &str,
        concurrency: usize,
    ) -> Vec<QuoteOutcome> {
        let sem = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut handles = Vec::new();

        for source in sources {
            let id = source.id();
            let source = Arc::clone(source);
            let pipeline = Arc::clone(self);
            let sem = Arc::clone(&sem);
            let query = query.to_string();

            let handle = tokio::spawn(async move {
                let _permit = sem.acquire().await.ok();
                pipeline.quote(source.as_ref(), &query).await
            });

            handles.push((id, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!("Internal error resolving {} for {:?}: {}", id, query, e);
                    outcomes.push(QuoteOutcome::NotFound(NotFound::new(
                        id,
                        query,
                        NotFoundReason::Internal,
                    )));
                }
            }
        }

        debug!(
            "compare({:?}): {} of {} sources found",
            query,
            outcomes.iter().filter(|o| o.quote().is_some()).count(),
            outcomes.len()
        );
        outcomes
    }
}

/// Found quotes that carry a price, cheapest first.
pub fn rank_by_price(outcomes: &[QuoteOutcome]) -> Vec<Quote> {
    let mut priced: Vec<_> = outcomes
        .iter()
        .filter_map(QuoteOutcome::quote)
        .filter(|q| q.price.is_some())
        .cloned()
        .collect();
    priced.sort_by(|a, b| {
        a.price
            .unwrap_or(f64::MAX)
            .total_cmp(&b.price.unwrap_or(f64::MAX))
    });
    priced
}
