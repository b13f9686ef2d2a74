//! Analysis engine over the canonical review collection
//!
//! All analyses consume the immutable collection read-only; nothing here
//! touches the network.

pub mod correlation;
pub mod location;
pub mod sort;

pub use correlation::{correlate, KeywordCorrelation, KeywordStats};
pub use location::{BucketKey, BucketSummary, LocationBuckets};
pub use sort::{sort_reviews, SortKey, SortOrder};
