//! Core types for the RevHarvest system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw review record as embedded in the listing page's data blob.
///
/// Deeply nested, externally defined, and allowed to omit any field;
/// consumed exactly once by the normalizer.
pub type RawRecord = serde_json::Value;

/// The canonical, fully shaped review record.
///
/// Every field except `id` is optional; absent fields serialize as
/// `null`. Instances are produced once by the normalizer and never
/// mutated afterwards.
///
/// Timestamp fields hold absolute instants reconstructed from ISO-8601
/// strings whose trailing `Z` marker was normalized to an explicit
/// offset; they serialize back to RFC 3339.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Opaque identifier, unique within a harvesting run.
    pub id: String,
    /// Consumer display name.
    pub display_name: Option<String>,
    /// Consumer country code.
    pub country_code: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    /// Star rating. Expected in [1,5]; out-of-range values are retained
    /// and surfaced by the normalizer, never clamped.
    pub rating: Option<i64>,
    pub likes: Option<i64>,
    pub language: Option<String>,
    /// Reviews this consumer has written for the same target domain.
    pub consumers_review_count_on_same_domain: Option<i64>,
    pub published_date: Option<DateTime<Utc>>,
    pub experienced_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
    /// Total number of reviews the consumer has written.
    pub review_count: Option<i64>,
    pub consumer_verified: Option<bool>,
    pub image_url: Option<String>,
    pub has_image: Option<bool>,
    pub review_verified: Option<bool>,
    pub review_verification_level: Option<String>,
    pub review_verification_source: Option<String>,
    pub review_verification_date: Option<DateTime<Utc>>,
    pub review_source_name: Option<String>,
    pub has_dach_exclusion: Option<bool>,
    pub reply_message: Option<String>,
    pub reply_published_date: Option<DateTime<Utc>>,
    pub reply_updated_date: Option<DateTime<Utc>>,
    pub filtered: Option<bool>,
    pub pending: Option<bool>,
    pub reported: Option<bool>,
    pub has_unhandled_reports: Option<bool>,
    pub location: Option<String>,
    /// Reviews this consumer has written for the same location.
    pub consumers_review_count_on_same_location: Option<i64>,
}

impl Review {
    /// A review with the given id and every optional field absent.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            country_code: None,
            title: None,
            text: None,
            rating: None,
            likes: None,
            language: None,
            consumers_review_count_on_same_domain: None,
            published_date: None,
            experienced_date: None,
            updated_date: None,
            review_count: None,
            consumer_verified: None,
            image_url: None,
            has_image: None,
            review_verified: None,
            review_verification_level: None,
            review_verification_source: None,
            review_verification_date: None,
            review_source_name: None,
            has_dach_exclusion: None,
            reply_message: None,
            reply_published_date: None,
            reply_updated_date: None,
            filtered: None,
            pending: None,
            reported: None,
            has_unhandled_reports: None,
            location: None,
            consumers_review_count_on_same_location: None,
        }
    }

    /// Whether this review carries both text and a rating, making it
    /// usable for keyword correlation.
    pub fn is_analyzable(&self) -> bool {
        self.rating.is_some() && self.text.as_deref().is_some_and(|t| !t.is_empty())
    }
}
