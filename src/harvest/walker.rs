//! Pagination walker
//!
//! Drives the fetch loop across increasing page indices, feeding each
//! page's extracted records through the normalizer into the run's
//! canonical collection. Two independent signals end a walk: an explicit
//! not-found response, and an empty extracted-record list. No
//! total-page-count field from the source is consulted. A fatal fetch
//! fault also ends the walk, but everything accumulated so far survives.

use rand::Rng;
use std::fmt;
use std::time::Duration;

use super::extract;
use super::fetcher::{FetchError, FetchOutcome, PageFetcher};
use super::normalize;
use super::url_builder::{build_listing_url, ListingOptions};
use crate::config::FetchConfig;
use crate::types::Review;

/// Why a walk ended.
#[derive(Debug)]
pub enum Termination {
    /// The service reported the next page does not exist.
    NotFound,
    /// A page rendered but carried no records (end of data).
    EmptyPage,
    /// The configured page cap was reached.
    PageLimit,
    /// A fatal fetch fault ended the walk early.
    Failed(FetchError),
}

impl Termination {
    /// Whether the walk ended on a fault rather than normal exhaustion.
    pub fn is_failure(&self) -> bool {
        matches!(self, Termination::Failed(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::NotFound => write!(f, "no further pages"),
            Termination::EmptyPage => write!(f, "end of data"),
            Termination::PageLimit => write!(f, "page budget exhausted"),
            Termination::Failed(e) => write!(f, "fetch fault: {}", e),
        }
    }
}

/// Result of one harvesting walk. Partial results are a valid,
/// non-error terminal state.
#[derive(Debug)]
pub struct WalkOutcome {
    /// Accumulated canonical reviews, in page order.
    pub reviews: Vec<Review>,
    /// Pages that contributed records.
    pub pages_fetched: u32,
    pub termination: Termination,
}

/// Walks listing pages for one target until a terminal condition.
pub struct PageWalker<'a> {
    fetcher: &'a dyn PageFetcher,
    base_url: String,
    page_delay_ms: (u64, u64),
    max_pages: u32,
}

impl<'a> PageWalker<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, config: &FetchConfig) -> Self {
        Self {
            fetcher,
            base_url: config.base_url.clone(),
            page_delay_ms: config.page_delay_ms,
            max_pages: config.max_pages.max(1),
        }
    }

    /// Walk pages 1..N for `target`, accumulating canonical reviews.
    pub async fn walk(&self, target: &str, options: &ListingOptions) -> WalkOutcome {
        let mut reviews: Vec<Review> = Vec::new();
        let mut pages_fetched = 0u32;
        let mut page = 1u32;

        let termination = loop {
            if page > self.max_pages {
                tracing::info!("Reached page cap of {}. Stopping.", self.max_pages);
                break Termination::PageLimit;
            }

            let url = build_listing_url(&self.base_url, target, page, options);
            tracing::debug!("Fetching page {} at {}", page, url);

            let html = match self.fetcher.fetch_listing(&url).await {
                Ok(FetchOutcome::Page(html)) => html,
                Ok(FetchOutcome::NotFound) => {
                    tracing::info!("Page {} does not exist. Stopping.", page);
                    break Termination::NotFound;
                }
                Err(e) => {
                    tracing::error!("Fetch fault on page {}: {}", page, e);
                    break Termination::Failed(e);
                }
            };

            let records = extract::listing_records(&html);
            if records.is_empty() {
                tracing::info!("Page {} yielded no records. Stopping.", page);
                break Termination::EmptyPage;
            }

            let before = reviews.len();
            reviews.extend(records.iter().filter_map(normalize::normalize));
            pages_fetched += 1;
            tracing::info!("Found {} reviews on page {}", reviews.len() - before, page);

            page += 1;
            self.inter_page_delay().await;
        };

        WalkOutcome {
            reviews,
            pages_fetched,
            termination,
        }
    }

    /// Randomized pause between page fetches to bound request rate.
    async fn inter_page_delay(&self) {
        let (min, max) = self.page_delay_ms;
        if max == 0 {
            return;
        }
        let delay_ms = {
            let mut rng = rand::thread_rng();
            rng.gen_range(min..=max)
        };
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
