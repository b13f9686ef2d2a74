//! Raw record extraction from a rendered listing page
//!
//! The listing service embeds its page state as a JSON blob in a
//! `script#__NEXT_DATA__` element; the review records live under
//! `props.pageProps.reviews`. A page without a usable blob yields an
//! empty record list, which the walker treats as end-of-data.

use scraper::{Html, Selector};

use crate::types::RawRecord;

/// Extract the raw review records embedded in a listing page.
pub fn listing_records(html: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse("script#__NEXT_DATA__") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let Some(script) = document.select(&selector).next() else {
        tracing::warn!("Listing page carries no embedded data blob");
        return Vec::new();
    };

    let blob: serde_json::Value = match serde_json::from_str(&script.inner_html()) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Embedded data blob is not valid JSON: {}", e);
            return Vec::new();
        }
    };

    blob.pointer("/props/pageProps/reviews")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}
