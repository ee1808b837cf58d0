use crate::models::RawFields;
use crate::scraper::currency;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

// ── Document ──────────────────────────────────────────────────────────────────

/// A rendered page snapshot: locator queries, visible text, raw content.
pub struct Document {
    html: Html,
    raw: String,
}

impl Document {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            html: Html::parse_document(&raw),
            raw,
        }
    }

    /// First element matching `locator`. An unparseable locator is a miss.
    pub fn query(&self, locator: &str) -> Option<ElementRef<'_>> {
        let Ok(sel) = Selector::parse(locator) else {
            debug!("Unparseable locator {:?}", locator);
            return None;
        };
        self.html.select(&sel).next()
    }

    pub fn text(&self, locator: &str) -> Option<String> {
        self.query(locator).map(visible_text)
    }

    pub fn attribute(&self, locator: &str, name: &str) -> Option<String> {
        self.query(locator)
            .and_then(|el| el.value().attr(name))
            .map(|s| s.to_string())
    }

    /// `href` of every anchor, in document order.
    pub fn anchor_hrefs(&self) -> Vec<&str> {
        let Ok(sel) = Selector::parse("a[href]") else {
            return vec![];
        };
        self.html
            .select(&sel)
            .filter_map(|a| a.value().attr("href"))
            .collect()
    }

    /// Serialized page content as delivered by the browser.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Element text with whitespace runs collapsed.
pub fn visible_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Strategies ────────────────────────────────────────────────────────────────

/// Alternative locators; the first one that matches an element is used.
#[derive(Debug, Clone, Copy)]
pub struct Strategy(pub &'static [&'static str]);

/// Ordered strategy lists per field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSelectors {
    pub name: &'static [Strategy],
    pub price: &'static [Strategy],
    pub mrp: &'static [Strategy],
    pub discount: &'static [Strategy],
}

/// Text captured by one strategy for one field.
#[derive(Debug)]
struct ExtractionAttempt {
    strategy: usize,
    locator: &'static str,
    text: String,
}

fn attempt(doc: &Document, index: usize, strategy: &Strategy) -> Option<ExtractionAttempt> {
    strategy.0.iter().copied().find_map(|locator| {
        doc.query(locator).map(|el| ExtractionAttempt {
            strategy: index,
            locator,
            text: visible_text(el),
        })
    })
}

/// Try strategies in order; the first one whose text parses wins.
pub fn extract_with<T: std::fmt::Debug>(
    doc: &Document,
    field: &str,
    strategies: &[Strategy],
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    for (i, strategy) in strategies.iter().enumerate() {
        let Some(hit) = attempt(doc, i, strategy) else {
            debug!("{}: strategy {} matched nothing", field, i);
            continue;
        };
        match parse(&hit.text) {
            Some(value) => {
                debug!(
                    "{}: strategy {} ({}) → {:?}",
                    field, hit.strategy, hit.locator, value
                );
                return Some(value);
            }
            None => debug!(
                "{}: strategy {} ({}) text {:?} did not parse",
                field, hit.strategy, hit.locator, hit.text
            ),
        }
    }
    None
}

fn non_empty(text: &str) -> Option<String> {
    let t = text.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

/// Positive currency amounts anywhere in the raw page.
pub fn page_amounts(doc: &Document) -> Vec<f64> {
    currency::all_amounts(doc.raw())
        .into_iter()
        .filter(|a| *a > 0.0)
        .collect()
}

/// Run the per-field cascade. Each field is extracted on its own; a miss
/// leaves only that field empty.
pub fn extract_fields(doc: &Document, selectors: &FieldSelectors) -> RawFields {
    let name = extract_with(doc, "name", selectors.name, non_empty);
    let mut price = extract_with(doc, "price", selectors.price, currency::first_amount);
    let mut mrp = extract_with(doc, "mrp", selectors.mrp, currency::first_amount);

    if price.is_none() || mrp.is_none() {
        let amounts = page_amounts(doc);
        if !amounts.is_empty() {
            let min = amounts.iter().copied().fold(f64::INFINITY, f64::min);
            let max = amounts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            debug!(
                "Raw-text fallback: {} amounts (min {}, max {})",
                amounts.len(),
                min,
                max
            );
            price.get_or_insert(min);
            mrp.get_or_insert(max);
        }
    }

    let discount = extract_with(doc, "discount", selectors.discount, currency::first_percent);

    RawFields {
        name,
        price,
        mrp,
        discount,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SELECTORS: FieldSelectors = FieldSelectors {
        name: &[Strategy(&["h1.title", "h1"])],
        price: &[Strategy(&["span.best"]), Strategy(&["span.price"])],
        mrp: &[Strategy(&["span.mrp strike", "strike"])],
        discount: &[Strategy(&["span.save"])],
    };

    #[test]
    fn test_all_fields_from_selectors() {
        let doc = Document::parse(
            r#"<h1 class="title">  Cetcip 10mg
                 Tablet </h1>
               <span class="best">₹80.00</span>
               <span class="mrp"><strike>₹100.00</strike></span>
               <span class="save">Save 20%</span>"#,
        );
        let raw = extract_fields(&doc, &SELECTORS);
        assert_eq!(raw.name.as_deref(), Some("Cetcip 10mg Tablet"));
        assert_eq!(raw.price, Some(80.0));
        assert_eq!(raw.mrp, Some(100.0));
        assert_eq!(raw.discount, Some(20.0));
    }

    #[test]
    fn test_first_strategy_wins_when_both_match() {
        let doc = Document::parse(
            r#"<span class="best">₹75</span><span class="price">₹90</span><strike>₹100</strike>"#,
        );
        assert_eq!(extract_fields(&doc, &SELECTORS).price, Some(75.0));
    }

    #[test]
    fn test_next_strategy_when_text_has_no_amount() {
        let doc = Document::parse(
            r#"<span class="best">Best price</span><span class="price">₹90</span><strike>₹100</strike>"#,
        );
        assert_eq!(extract_fields(&doc, &SELECTORS).price, Some(90.0));
    }

    #[test]
    fn test_alternate_locator_inside_strategy() {
        let doc = Document::parse(
            r#"<div><strike>₹1,250.00</strike></div><span class="best">₹1,000</span>"#,
        );
        let raw = extract_fields(&doc, &SELECTORS);
        assert_eq!(raw.mrp, Some(1250.0));
        assert_eq!(raw.price, Some(1000.0));
    }

    #[test]
    fn test_raw_text_fallback_uses_min_and_max() {
        let doc = Document::parse(
            r#"<div class="box"><p>₹120</p><p>₹ 95.50</p><p>₹0</p><p>₹110</p></div>"#,
        );
        let raw = extract_fields(&doc, &SELECTORS);
        assert_eq!(raw.price, Some(95.5));
        assert_eq!(raw.mrp, Some(120.0));
    }

    #[test]
    fn test_fallback_fills_only_missing_field() {
        let doc = Document::parse(r#"<span class="best">₹80</span><p>₹40</p><p>₹150</p>"#);
        let raw = extract_fields(&doc, &SELECTORS);
        assert_eq!(raw.price, Some(80.0));
        assert_eq!(raw.mrp, Some(150.0));
    }

    #[test]
    fn test_no_amounts_anywhere() {
        let doc = Document::parse(r#"<h1>Aricep 5 Tablet</h1><p>Currently unavailable</p>"#);
        let raw = extract_fields(&doc, &SELECTORS);
        assert_eq!(raw.name.as_deref(), Some("Aricep 5 Tablet"));
        assert_eq!(raw.price, None);
        assert_eq!(raw.mrp, None);
        assert_eq!(raw.discount, None);
    }

    #[test]
    fn test_name_miss_does_not_affect_prices() {
        let html =
            r#"<span class="best">₹80</span><strike>₹100</strike><span class="save">20% OFF</span>"#;
        let broken = FieldSelectors {
            name: &[Strategy(&["h1[[["]), Strategy(&["h2.nothing"])],
            ..SELECTORS
        };
        let doc = Document::parse(html);
        let with_name = extract_fields(&doc, &SELECTORS);
        let without_name = extract_fields(&doc, &broken);
        assert_eq!(without_name.name, None);
        assert_eq!(with_name.price, without_name.price);
        assert_eq!(with_name.mrp, without_name.mrp);
        assert_eq!(with_name.discount, without_name.discount);
    }

    #[test]
    fn test_document_attribute_and_anchors() {
        let doc = Document::parse(
            r#"<a href="/about">About</a><a>no href</a><a href="/drugs/x-1" data-id="7">X</a>"#,
        );
        assert_eq!(doc.anchor_hrefs(), vec!["/about", "/drugs/x-1"]);
        assert_eq!(doc.attribute("a[data-id]", "data-id").as_deref(), Some("7"));
        assert_eq!(doc.text("a[data-id]").as_deref(), Some("X"));
        assert!(doc.query("div").is_none());
    }
}
