//! JSON sink
//!
//! Serializes the canonical collection as a pretty-printed array.
//! Absent fields appear as `null`; timestamps as RFC 3339 strings that
//! re-parse to the exact original instants.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::types::Review;

/// Write the review collection as a JSON array to `path`.
pub fn write_reviews_json(path: &Path, reviews: &[Review]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON file '{}'", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, reviews)
        .with_context(|| format!("Failed to serialize reviews to '{}'", path.display()))?;
    Ok(())
}
