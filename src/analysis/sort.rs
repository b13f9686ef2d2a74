//! Filter/sort engine for the canonical collection
//!
//! Sorting is stable with respect to equal keys so output stays
//! reproducible across runs given otherwise-unordered page arrival.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::types::Review;

/// Fields the collection can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    PublishedDate,
    ExperiencedDate,
    UpdatedDate,
    Rating,
    Likes,
    ReviewCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Reorder the collection by `key` in `order`.
///
/// Sorting by a field with no present value anywhere is a no-op.
/// Absent timestamps order as the earliest possible instant; absent
/// numeric fields order as zero. Descending order reverses the
/// comparator, not the result, so ties keep their insertion order.
pub fn sort_reviews(reviews: &mut [Review], key: SortKey, order: SortOrder) {
    if !reviews.iter().any(|r| has_value(r, key)) {
        return;
    }

    reviews.sort_by(|a, b| {
        let ordering = compare_by(a, b, key);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

fn has_value(review: &Review, key: SortKey) -> bool {
    match key {
        SortKey::PublishedDate => review.published_date.is_some(),
        SortKey::ExperiencedDate => review.experienced_date.is_some(),
        SortKey::UpdatedDate => review.updated_date.is_some(),
        SortKey::Rating => review.rating.is_some(),
        SortKey::Likes => review.likes.is_some(),
        SortKey::ReviewCount => review.review_count.is_some(),
    }
}

fn compare_by(a: &Review, b: &Review, key: SortKey) -> Ordering {
    fn instant(value: Option<DateTime<Utc>>) -> DateTime<Utc> {
        value.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    match key {
        SortKey::PublishedDate => instant(a.published_date).cmp(&instant(b.published_date)),
        SortKey::ExperiencedDate => instant(a.experienced_date).cmp(&instant(b.experienced_date)),
        SortKey::UpdatedDate => instant(a.updated_date).cmp(&instant(b.updated_date)),
        SortKey::Rating => a.rating.unwrap_or(0).cmp(&b.rating.unwrap_or(0)),
        SortKey::Likes => a.likes.unwrap_or(0).cmp(&b.likes.unwrap_or(0)),
        SortKey::ReviewCount => a.review_count.unwrap_or(0).cmp(&b.review_count.unwrap_or(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn review(id: &str, rating: Option<i64>) -> Review {
        let mut r = Review::empty(id);
        r.rating = rating;
        r
    }

    fn ids(reviews: &[Review]) -> Vec<&str> {
        reviews.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn all_absent_key_is_a_no_op_preserving_order() {
        let mut reviews = vec![review("a", None), review("b", None), review("c", None)];
        sort_reviews(&mut reviews, SortKey::Rating, SortOrder::Descending);
        assert_eq!(ids(&reviews), ["a", "b", "c"]);
    }

    #[test]
    fn sorts_ascending_by_rating_with_absent_as_zero() {
        let mut reviews = vec![
            review("five", Some(5)),
            review("none", None),
            review("two", Some(2)),
        ];
        sort_reviews(&mut reviews, SortKey::Rating, SortOrder::Ascending);
        assert_eq!(ids(&reviews), ["none", "two", "five"]);
    }

    #[test]
    fn descending_keeps_tie_insertion_order() {
        let mut reviews = vec![
            review("first", Some(3)),
            review("second", Some(3)),
            review("third", Some(5)),
            review("fourth", Some(3)),
        ];
        sort_reviews(&mut reviews, SortKey::Rating, SortOrder::Descending);
        assert_eq!(ids(&reviews), ["third", "first", "second", "fourth"]);
    }

    #[test]
    fn absent_timestamps_order_earliest() {
        let mut dated = review("dated", None);
        dated.published_date = Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        let mut reviews = vec![dated, review("undated", None)];

        sort_reviews(&mut reviews, SortKey::PublishedDate, SortOrder::Ascending);
        assert_eq!(ids(&reviews), ["undated", "dated"]);

        sort_reviews(&mut reviews, SortKey::PublishedDate, SortOrder::Descending);
        assert_eq!(ids(&reviews), ["dated", "undated"]);
    }

    #[test]
    fn sorts_by_timestamp_values() {
        let mut early = review("early", None);
        early.published_date = Some(Utc.with_ymd_and_hms(2022, 5, 1, 0, 0, 0).unwrap());
        let mut late = review("late", None);
        late.published_date = Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        let mut reviews = vec![late.clone(), early.clone()];
        sort_reviews(&mut reviews, SortKey::PublishedDate, SortOrder::Ascending);
        assert_eq!(ids(&reviews), ["early", "late"]);
    }
}
