//! Currency and percentage extraction from free text.
//!
//! "MRP ₹1,234.50" → 1234.5 | "Save 20%" → 20.0

use regex::Regex;
use std::sync::LazyLock;

static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:₹|\bRs\.?|\bINR)\s*([0-9][0-9,]*(?:\.[0-9]+)?)")
        .expect("currency pattern compiles")
});

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*%").expect("percent pattern compiles")
});

/// Strip thousands separators and parse.
fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    cleaned.parse().ok().filter(|v: &f64| v.is_finite())
}

/// First currency-shaped amount in `text`.
pub fn first_amount(text: &str) -> Option<f64> {
    CURRENCY_RE
        .captures_iter(text)
        .find_map(|c| c.get(1).and_then(|m| parse_number(m.as_str())))
}

/// Every currency-shaped amount in `text`, in order of appearance.
pub fn all_amounts(text: &str) -> Vec<f64> {
    CURRENCY_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1).and_then(|m| parse_number(m.as_str())))
        .collect()
}

/// First percentage in `text`. "20% OFF" → 20.0
pub fn first_percent(text: &str) -> Option<f64> {
    PERCENT_RE
        .captures_iter(text)
        .find_map(|c| c.get(1).and_then(|m| parse_number(m.as_str())))
}
