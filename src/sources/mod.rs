//! Storefront adapters: URL shapes, link strategies and field selectors.
//!
//! The pipeline is written once; a storefront is one `SourceAdapter` value.

use crate::browser::Readiness;
use crate::models::SourceId;
use crate::scraper::parsers::{FieldSelectors, Strategy};

/// How a product link is found for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// `"{query} site:{domain}"` against the external search index.
    SearchIndex { domain: &'static str },
    /// Render the storefront's own search page, `{search_url}?{query_param}={query}`.
    OnSite {
        search_url: &'static str,
        query_param: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct SourceAdapter {
    pub id: SourceId,
    /// Base for resolving relative links.
    pub origin: &'static str,
    /// Substring a candidate URL must contain to be accepted.
    pub product_url_pattern: &'static str,
    /// In order of preference; the first one that can run is used.
    pub search: &'static [SearchStrategy],
    pub readiness: Readiness,
    pub fields: FieldSelectors,
}

impl SourceAdapter {
    pub fn accepts(&self, url: &str) -> bool {
        url.contains(self.product_url_pattern)
    }
}

// ── PharmEasy ─────────────────────────────────────────────────────────────────

pub static PHARMEASY: SourceAdapter = SourceAdapter {
    id: SourceId::PharmEasy,
    origin: "https://pharmeasy.in",
    product_url_pattern: "/online-medicine-order/",
    search: &[
        SearchStrategy::OnSite {
            search_url: "https://pharmeasy.in/search/all",
            query_param: "name",
        },
        SearchStrategy::SearchIndex {
            domain: "pharmeasy.in",
        },
    ],
    readiness: Readiness::Settle,
    fields: FieldSelectors {
        name: &[Strategy(&[
            "h1.MedicineOverviewSection_medicineName__9K61u",
            "h1[class*='medicineName']",
        ])],
        price: &[Strategy(&[
            "span.PriceInfo_unitPriceDecimal__i3Shz",
            "span[class*='PriceInfo']",
        ])],
        mrp: &[Strategy(&[
            "span.PriceInfo_striked__fmcJv",
            "span[class*='PriceInfo']",
        ])],
        discount: &[Strategy(&["div.PriceInfo_gcdDiscountPercent__FvJsG"])],
    },
};

// ── Netmeds ───────────────────────────────────────────────────────────────────

pub static NETMEDS: SourceAdapter = SourceAdapter {
    id: SourceId::Netmeds,
    origin: "https://www.netmeds.com",
    product_url_pattern: "/prescriptions/",
    search: &[SearchStrategy::SearchIndex {
        domain: "netmeds.com",
    }],
    readiness: Readiness::Marker("div.price-box"),
    fields: FieldSelectors {
        name: &[Strategy(&["h1"])],
        price: &[Strategy(&["span.final-price", "span[class*='price']"])],
        mrp: &[Strategy(&["span.price strike", "strike"])],
        discount: &[Strategy(&["span.disc-price"])],
    },
};

// ── 1mg ───────────────────────────────────────────────────────────────────────

pub static ONE_MG: SourceAdapter = SourceAdapter {
    id: SourceId::OneMg,
    origin: "https://www.1mg.com",
    product_url_pattern: "/drugs/",
    search: &[
        SearchStrategy::OnSite {
            search_url: "https://www.1mg.com/search/all",
            query_param: "name",
        },
        SearchStrategy::SearchIndex { domain: "1mg.com" },
    ],
    readiness: Readiness::Marker("div[class*='DrugPriceBox']"),
    fields: FieldSelectors {
        name: &[Strategy(&["h1[class*='DrugHeader__title-content']"])],
        // best-price block first, plain price block second
        price: &[
            Strategy(&["div[class*='DrugPriceBox__best-price']"]),
            Strategy(&["div[class*='DrugPriceBox__price']"]),
        ],
        mrp: &[Strategy(&["span[class*='DrugPriceBox__slashed-price']"])],
        discount: &[Strategy(&["span[class*='DrugPriceBox__slashed-percent']"])],
    },
};

// ── Registry ──────────────────────────────────────────────────────────────────

pub fn all() -> [&'static SourceAdapter; 3] {
    [&PHARMEASY, &NETMEDS, &ONE_MG]
}

pub fn adapter(id: SourceId) -> &'static SourceAdapter {
    match id {
        SourceId::PharmEasy => &PHARMEASY,
        SourceId::Netmeds => &NETMEDS,
        SourceId::OneMg => &ONE_MG,
    }
}
