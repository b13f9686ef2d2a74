//! CSV sinks
//!
//! Review rows use a `;` delimiter with minimal quoting and a UTF-8 BOM
//! prefix so spreadsheet tools pick the encoding up; the column order is
//! fixed and stable. Timestamps serialize as RFC 3339, absent fields as
//! empty cells, booleans as `true`/`false`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::analysis::correlation::KeywordRow;
use crate::types::Review;

/// Fixed column order for review rows.
const REVIEW_COLUMNS: [&str; 31] = [
    "id",
    "display_name",
    "country_code",
    "title",
    "text",
    "rating",
    "likes",
    "language",
    "consumers_review_count_on_same_domain",
    "published_date",
    "experienced_date",
    "updated_date",
    "review_count",
    "consumer_verified",
    "image_url",
    "has_image",
    "review_verified",
    "review_verification_level",
    "review_verification_source",
    "review_verification_date",
    "review_source_name",
    "has_dach_exclusion",
    "reply_message",
    "reply_published_date",
    "reply_updated_date",
    "filtered",
    "pending",
    "reported",
    "has_unhandled_reports",
    "location",
    "consumers_review_count_on_same_location",
];

/// Write one row per review to `path`.
pub fn write_reviews_csv(path: &Path, reviews: &[Review]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create CSV file '{}'", path.display()))?;
    // UTF-8 BOM for spreadsheet compatibility
    file.write_all("\u{feff}".as_bytes())?;

    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);
    writer.write_record(REVIEW_COLUMNS)?;
    for review in reviews {
        writer.write_record(review_record(review))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write keyword-analysis rows (term, mean rating, count) to `path`.
pub fn write_keywords_csv(path: &Path, rows: &[KeywordRow]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file '{}'", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(["keyword", "average_rating", "count"])?;
    for row in rows {
        writer.write_record([
            row.term.clone(),
            format!("{:.4}", row.mean_rating),
            row.count.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn review_record(review: &Review) -> Vec<String> {
    vec![
        review.id.clone(),
        opt_str(&review.display_name),
        opt_str(&review.country_code),
        opt_str(&review.title),
        opt_str(&review.text),
        opt_int(review.rating),
        opt_int(review.likes),
        opt_str(&review.language),
        opt_int(review.consumers_review_count_on_same_domain),
        opt_instant(review.published_date),
        opt_instant(review.experienced_date),
        opt_instant(review.updated_date),
        opt_int(review.review_count),
        opt_bool(review.consumer_verified),
        opt_str(&review.image_url),
        opt_bool(review.has_image),
        opt_bool(review.review_verified),
        opt_str(&review.review_verification_level),
        opt_str(&review.review_verification_source),
        opt_instant(review.review_verification_date),
        opt_str(&review.review_source_name),
        opt_bool(review.has_dach_exclusion),
        opt_str(&review.reply_message),
        opt_instant(review.reply_published_date),
        opt_instant(review.reply_updated_date),
        opt_bool(review.filtered),
        opt_bool(review.pending),
        opt_bool(review.reported),
        opt_bool(review.has_unhandled_reports),
        opt_str(&review.location),
        opt_int(review.consumers_review_count_on_same_location),
    ]
}

fn opt_str(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_int(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_bool(value: Option<bool>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_instant(value: Option<DateTime<Utc>>) -> String {
    value.map(|v| v.to_rfc3339()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn header_and_rows_use_semicolon_delimiter_and_bom() {
        let mut review = Review::empty("r1");
        review.rating = Some(5);
        review.text = Some("fine; really".to_string());
        review.published_date = Some(Utc.with_ymd_and_hms(2023, 6, 1, 10, 0, 0).unwrap());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.csv");
        write_reviews_csv(&path, &[review]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with('\u{feff}'));

        let mut lines = content.trim_start_matches('\u{feff}').lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id;display_name;country_code"));
        assert_eq!(header.split(';').count(), REVIEW_COLUMNS.len());

        let row = lines.next().unwrap();
        assert!(row.starts_with("r1;"));
        // The embedded delimiter forces quoting
        assert!(row.contains("\"fine; really\""));
        assert!(row.contains("2023-06-01T10:00:00+00:00"));
    }

    #[test]
    fn absent_fields_are_empty_cells() {
        let review = Review::empty("only-id");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.csv");
        write_reviews_csv(&path, &[review]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert_eq!(row.split(';').count(), REVIEW_COLUMNS.len());
        assert_eq!(row, format!("only-id{}", ";".repeat(REVIEW_COLUMNS.len() - 1)));
    }

    #[test]
    fn keyword_rows_carry_mean_and_count() {
        let rows = vec![
            KeywordRow {
                term: "refund".to_string(),
                mean_rating: 1.25,
                count: 4,
            },
            KeywordRow {
                term: "great".to_string(),
                mean_rating: 5.0,
                count: 9,
            },
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.csv");
        write_keywords_csv(&path, &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "keyword,average_rating,count");
        assert_eq!(lines[1], "refund,1.2500,4");
        assert_eq!(lines[2], "great,5.0000,9");
    }
}
