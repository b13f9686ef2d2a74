//! Review harvesting pipeline
//!
//! URL construction, dual-mode page fetching, pagination walking, raw
//! record extraction, and normalization into the canonical schema.

pub mod browser;
pub mod extract;
pub mod fetcher;
pub mod normalize;
pub mod url_builder;
pub mod walker;

pub use browser::DynamicFetcher;
pub use fetcher::{FetchError, FetchOutcome, PageFetcher, StaticFetcher};
pub use url_builder::{build_listing_url, DateWindow, ListingOptions};
pub use walker::{PageWalker, Termination, WalkOutcome};
