//! Output sinks for the canonical collection and analysis results

pub mod charts;
pub mod csv;
pub mod json;

pub use self::charts::write_location_charts;
pub use self::csv::{write_keywords_csv, write_reviews_csv};
pub use self::json::write_reviews_json;
