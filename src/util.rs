//! Shared utility functions

use chrono::{DateTime, Utc};

/// Truncate a string to a maximum length, appending "..." if truncated.
/// Handles multi-byte characters by finding a valid char boundary.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let suffix = "...";
    let target = max_len.saturating_sub(suffix.len());
    // Find a valid char boundary at or before target
    let mut end = target;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &s[..end], suffix)
}

/// Compact timestamp slug for output file names (e.g. `20260806143015`).
pub fn timestamp_slug(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}
