use crate::models::{Quote, RawFields, SourceId};
use tracing::{debug, warn};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Round to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Negative or non-finite amounts are treated as absent.
fn valid_amount(v: Option<f64>) -> Option<f64> {
    v.filter(|a| a.is_finite() && *a >= 0.0)
}

/// Discount implied by price and MRP, only when MRP is positive and not
/// below the price.
pub fn implied_discount(price: Option<f64>, mrp: Option<f64>) -> Option<f64> {
    match (price, mrp) {
        (Some(p), Some(m)) if m > 0.0 && m >= p => Some(round2((1.0 - p / m) * 100.0)),
        _ => None,
    }
}

// ── Raw fields → Quote ────────────────────────────────────────────────────────

pub fn normalize(pharmacy: SourceId, link: &str, raw: RawFields) -> Quote {
    let name = raw.name.and_then(|n| {
        let n = n.trim();
        if n.is_empty() { None } else { Some(n.to_string()) }
    });
    let price = valid_amount(raw.price);
    let mrp = valid_amount(raw.mrp);

    let explicit = raw.discount.filter(|d| d.is_finite() && (0.0..=100.0).contains(d));
    if raw.discount.is_some() && explicit.is_none() {
        warn!("{}: discarding out-of-range discount {:?}", pharmacy, raw.discount);
    }

    let discount_percent = match explicit {
        Some(d) => round2(d),
        None => {
            let implied = implied_discount(price, mrp);
            debug!("{}: discount derived from price/mrp: {:?}", pharmacy, implied);
            implied.unwrap_or(0.0)
        }
    };

    Quote {
        pharmacy,
        name,
        price,
        mrp,
        discount_percent,
        link: link.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
