//! Per-location review aggregation
//!
//! Buckets canonical reviews by a location key, tracking count and mean
//! rating per bucket. Buckets exist only once a review lands in them, so
//! a zero-count division can never happen. Finalized output is ordered
//! by count descending with first-appearance order breaking ties, and
//! feeds both the compact run summary and the chart sink (which must
//! share bucket order across its two series).

use std::collections::HashMap;

use crate::types::Review;

/// Sentinel bucket for reviews without a usable key.
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// Which review field keys the buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKey {
    /// The review's free-form location.
    Location,
    /// The consumer's country code.
    CountryCode,
}

#[derive(Debug, Default)]
struct BucketAccum {
    count: usize,
    rating_sum: f64,
    rated: usize,
}

/// Insertion-ordered location buckets.
#[derive(Debug)]
pub struct LocationBuckets {
    key: BucketKey,
    order: Vec<String>,
    buckets: HashMap<String, BucketAccum>,
}

/// One finalized bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSummary {
    pub label: String,
    pub count: usize,
    /// Mean over members that carry a rating; absent when none do.
    pub mean_rating: Option<f64>,
}

impl LocationBuckets {
    pub fn new(key: BucketKey) -> Self {
        Self {
            key,
            order: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    /// Bucket every review in the collection.
    pub fn collect(reviews: &[Review], key: BucketKey) -> Self {
        let mut buckets = Self::new(key);
        for review in reviews {
            buckets.push(review);
        }
        buckets
    }

    /// Append one review to its bucket, materializing the bucket on
    /// first use.
    pub fn push(&mut self, review: &Review) {
        let label = self.label_for(review);
        let accum = match self.buckets.get_mut(&label) {
            Some(existing) => existing,
            None => {
                self.order.push(label.clone());
                self.buckets.entry(label).or_default()
            }
        };
        accum.count += 1;
        if let Some(rating) = review.rating {
            accum.rating_sum += rating as f64;
            accum.rated += 1;
        }
    }

    fn label_for(&self, review: &Review) -> String {
        let value = match self.key {
            BucketKey::Location => review.location.as_deref(),
            BucketKey::CountryCode => review.country_code.as_deref(),
        };
        value
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN_BUCKET)
            .to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Finalize into summaries ordered by count descending; ties keep
    /// first-appearance order.
    pub fn finalize(&self) -> Vec<BucketSummary> {
        let mut summaries: Vec<BucketSummary> = self
            .order
            .iter()
            .map(|label| {
                let accum = &self.buckets[label];
                BucketSummary {
                    label: label.clone(),
                    count: accum.count,
                    mean_rating: (accum.rated > 0)
                        .then(|| accum.rating_sum / accum.rated as f64),
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.count.cmp(&a.count));
        summaries
    }
}
