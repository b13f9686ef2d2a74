//! Sink-format tests: normalized records through the CSV and JSON sinks.

use revharvest::harvest::normalize::normalize;
use revharvest::output::{write_reviews_csv, write_reviews_json};
use revharvest::Review;
use serde_json::json;

fn sample_reviews() -> Vec<Review> {
    let raw_pages = [
        json!({
            "id": "r-1",
            "rating": 5,
            "text": "great service",
            "title": "Recommended",
            "language": "en",
            "dates": {"publishedDate": "2023-06-01T10:00:00Z"},
            "consumer": {"displayName": "Ada", "countryCode": "DE", "numberOfReviews": 3},
            "reply": {"message": "thank you", "publishedDate": "2023-06-02T09:00:00Z"},
        }),
        json!({
            "id": "r-2",
            "rating": 1,
            "text": "refund refused; support unreachable",
            "consumer": {"countryCode": "US"},
        }),
        json!({
            "id": "r-3",
        }),
    ];
    raw_pages.iter().filter_map(normalize).collect()
}

#[test]
fn csv_sink_writes_one_row_per_review_with_stable_header() {
    let reviews = sample_reviews();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.csv");

    write_reviews_csv(&path, &reviews).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with('\u{feff}'));

    let lines: Vec<&str> = content.trim_start_matches('\u{feff}').lines().collect();
    assert_eq!(lines.len(), 1 + reviews.len());
    assert!(lines[0].starts_with("id;display_name;country_code;title;text;rating"));
    assert!(lines[1].contains("2023-06-01T10:00:00+00:00"));
    // Field containing the delimiter is quoted
    assert!(lines[2].contains("\"refund refused; support unreachable\""));
}

#[test]
fn json_sink_round_trips_normalized_records_exactly() {
    let reviews = sample_reviews();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.json");

    write_reviews_json(&path, &reviews).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let back: Vec<Review> = serde_json::from_str(&content).unwrap();
    assert_eq!(back, reviews);

    // Re-normalizing the serialized timestamps reproduces the instants
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let published = value[0]["published_date"].as_str().unwrap();
    let reparsed = revharvest::harvest::normalize::parse_instant(Some(published)).unwrap();
    assert_eq!(reparsed, reviews[0].published_date.unwrap());
}

#[test]
fn json_sink_emits_null_for_absent_fields() {
    let reviews = sample_reviews();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.json");

    write_reviews_json(&path, &reviews).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    // r-3 carried nothing but its id
    assert_eq!(value[2]["id"], "r-3");
    assert!(value[2]["rating"].is_null());
    assert!(value[2]["text"].is_null());
    assert!(value[2]["reply_message"].is_null());
}
