//! RevHarvest: review harvesting and analysis for paginated listing pages
//!
//! A pipeline for collecting consumer reviews from a paginated,
//! JavaScript-rendered listing service, featuring:
//! - Deterministic listing-URL construction from a filter option set
//! - Dual-mode page fetching (plain HTTP or a scrolling headless browser)
//!   with bounded, jittered retries
//! - Pagination walking with end-of-data detection and partial-result
//!   preservation on fatal fetch faults
//! - Null-safe normalization of nested raw records into a flat canonical
//!   review schema
//! - Keyword-to-rating Pearson correlation with significance testing
//! - Per-location aggregation for summaries and chart output

pub mod analysis;
pub mod compliance;
pub mod config;
pub mod harvest;
pub mod output;
pub mod types;
pub mod util;

pub use config::Config;
pub use types::Review;
