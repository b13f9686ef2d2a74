//! Raw record normalization
//!
//! Maps one raw nested record into the canonical flat schema. Every
//! field access is null-safe: a missing nested object (dates, consumer,
//! verification labels, reply) yields absent values for all of its
//! sub-fields. Malformed inputs degrade to absent, never to an error;
//! listing markup evolves independently of this harvester, so total
//! behavior beats strict validation here.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::{RawRecord, Review};

/// Normalize a raw record into a canonical review.
///
/// Returns `None` only when the record carries no usable `id`; the
/// canonical schema requires one. Pure apart from anomaly logging:
/// normalizing the same record twice yields identical output.
pub fn normalize(raw: &RawRecord) -> Option<Review> {
    let id = match raw.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            tracing::warn!("Skipping raw record without id");
            return None;
        }
    };

    let rating = get_i64(raw, "rating");
    if let Some(r) = rating {
        if !(1..=5).contains(&r) {
            tracing::warn!("Review {} carries out-of-range rating {}", id, r);
        }
    }

    let dates = raw.get("dates");
    let consumer = raw.get("consumer");
    let verification = raw.pointer("/labels/verification");
    let reply = raw.get("reply").filter(|r| !r.is_null());

    Some(Review {
        id,
        display_name: nested_str(consumer, "displayName"),
        country_code: nested_str(consumer, "countryCode"),
        title: get_str(raw, "title"),
        text: get_str(raw, "text"),
        rating,
        likes: get_i64(raw, "likes"),
        language: get_str(raw, "language"),
        consumers_review_count_on_same_domain: get_i64(raw, "consumersReviewCountOnSameDomain"),
        published_date: parse_instant(nested_raw_str(dates, "publishedDate")),
        experienced_date: parse_instant(nested_raw_str(dates, "experiencedDate")),
        updated_date: parse_instant(nested_raw_str(dates, "updatedDate")),
        review_count: nested_i64(consumer, "numberOfReviews"),
        consumer_verified: nested_bool(consumer, "isVerified"),
        image_url: nested_str(consumer, "imageUrl"),
        has_image: nested_bool(consumer, "hasImage"),
        review_verified: nested_bool(verification, "isVerified"),
        review_verification_level: nested_str(verification, "verificationLevel"),
        review_verification_source: nested_str(verification, "verificationSource"),
        review_verification_date: parse_instant(nested_raw_str(verification, "createdDateTime")),
        review_source_name: nested_str(verification, "reviewSourceName"),
        has_dach_exclusion: nested_bool(verification, "hasDachExclusion"),
        reply_message: nested_str(reply, "message"),
        reply_published_date: parse_instant(nested_raw_str(reply, "publishedDate")),
        reply_updated_date: parse_instant(nested_raw_str(reply, "updatedDate")),
        filtered: get_bool(raw, "filtered"),
        pending: get_bool(raw, "pending"),
        reported: reported_flag(raw),
        has_unhandled_reports: get_bool(raw, "hasUnhandledReports"),
        location: location_name(raw),
        consumers_review_count_on_same_location: get_i64(raw, "consumersReviewCountOnSameLocation"),
    })
}

/// Parse an ISO-8601 string into an absolute instant.
///
/// A trailing `Z` zone marker is normalized to an explicit zero offset
/// before interpretation. Missing, empty, or malformed input yields
/// absent.
pub fn parse_instant(value: Option<&str>) -> Option<DateTime<Utc>> {
    let s = value?.trim();
    if s.is_empty() {
        return None;
    }
    let normalized = match s.strip_suffix('Z') {
        Some(body) => format!("{}+00:00", body),
        None => s.to_string(),
    };
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn get_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn get_bool(value: &Value, key: &str) -> Option<bool> {
    value.get(key).and_then(Value::as_bool)
}

fn get_i64(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(Value::as_i64)
}

fn nested_str(parent: Option<&Value>, key: &str) -> Option<String> {
    parent.and_then(|p| get_str(p, key))
}

fn nested_bool(parent: Option<&Value>, key: &str) -> Option<bool> {
    parent.and_then(|p| get_bool(p, key))
}

fn nested_i64(parent: Option<&Value>, key: &str) -> Option<i64> {
    parent.and_then(|p| get_i64(p, key))
}

fn nested_raw_str<'a>(parent: Option<&'a Value>, key: &str) -> Option<&'a str> {
    parent.and_then(|p| p.get(key)).and_then(Value::as_str)
}

/// The source emits `location` either as a plain string or as an object
/// carrying a `name`.
fn location_name(raw: &Value) -> Option<String> {
    match raw.get("location") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Object(map)) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// `report` is absent/null when unreported; a boolean or an arbitrary
/// report object otherwise.
fn reported_flag(raw: &Value) -> Option<bool> {
    match raw.get("report") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => Some(true),
    }
}
