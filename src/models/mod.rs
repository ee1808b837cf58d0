use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Source id ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum SourceId {
    #[serde(rename = "PharmEasy")]
    #[value(name = "pharmeasy")]
    PharmEasy,
    #[serde(rename = "Netmeds")]
    #[value(name = "netmeds")]
    Netmeds,
    #[serde(rename = "1mg")]
    #[value(name = "1mg")]
    OneMg,
}

impl SourceId {
    /// Display label, as it appears in records.
    pub fn label(self) -> &'static str {
        match self {
            SourceId::PharmEasy => "PharmEasy",
            SourceId::Netmeds => "Netmeds",
            SourceId::OneMg => "1mg",
        }
    }

    /// Lowercase key used for file names and CLI values.
    pub fn slug(self) -> &'static str {
        match self {
            SourceId::PharmEasy => "pharmeasy",
            SourceId::Netmeds => "netmeds",
            SourceId::OneMg => "1mg",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Quote ─────────────────────────────────────────────────────────────────────

/// Normalized price record for one product at one source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub pharmacy: SourceId,
    pub name: Option<String>,
    pub price: Option<f64>,          // discounted / unit price
    pub mrp: Option<f64>,            // list price
    pub discount_percent: f64,       // 0.0 ..= 100.0
    pub link: String,
}

/// Field values as read off a page, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFields {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub mrp: Option<f64>,
    pub discount: Option<f64>,
}

// ── Search index ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: Option<String>,
    pub snippet: Option<String>,
}

// ── Resolution outcome ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundReason {
    /// No candidate link matched the product URL pattern.
    NoMatch,
    /// The search index call failed.
    SearchFailed,
    /// Index-only source and no index configured.
    NoStrategy,
    /// A browsing session could not be opened.
    BrowserUnavailable,
    /// The resolution task itself failed (panic or cancellation).
    Internal,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotFoundReason::NoMatch => "no matching product link",
            NotFoundReason::SearchFailed => "search index request failed",
            NotFoundReason::NoStrategy => "no link strategy available",
            NotFoundReason::BrowserUnavailable => "browser session unavailable",
            NotFoundReason::Internal => "internal error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotFound {
    pub pharmacy: SourceId,
    pub error: String,
    pub query: String,
    pub reason: NotFoundReason,
}

impl NotFound {
    pub fn new(pharmacy: SourceId, query: &str, reason: NotFoundReason) -> Self {
        Self {
            pharmacy,
            error: "Product not found".to_string(),
            query: query.to_string(),
            reason,
        }
    }
}

/// What one (source, query) resolution produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuoteOutcome {
    Found(Quote),
    NotFound(NotFound),
}

impl QuoteOutcome {
    pub fn pharmacy(&self) -> SourceId {
        match self {
            QuoteOutcome::Found(q) => q.pharmacy,
            QuoteOutcome::NotFound(n) => n.pharmacy,
        }
    }

    pub fn quote(&self) -> Option<&Quote> {
        match self {
            QuoteOutcome::Found(q) => Some(q),
            QuoteOutcome::NotFound(_) => None,
        }
    }
}

// ── CSV rows ──────────────────────────────────────────────────────────────────

/// One line of a per-source CSV store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteRow {
    pub pharmacy: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub mrp: Option<f64>,
    pub discount_percent: f64,
    pub link: String,
    /// Absent in stores written before timestamps were recorded.
    #[serde(default)]
    pub scraped_at: Option<NaiveDateTime>,
}

impl QuoteRow {
    pub fn from_quote(q: &Quote, scraped_at: NaiveDateTime) -> Self {
        Self {
            pharmacy: q.pharmacy.label().to_string(),
            name: q.name.clone(),
            price: q.price,
            mrp: q.mrp,
            discount_percent: q.discount_percent,
            link: q.link.clone(),
            scraped_at: Some(scraped_at),
        }
    }
}
