//! Chart sink
//!
//! Renders the location aggregation as two bar-chart images sharing
//! bucket order: review counts per bucket and mean rating per bucket.
//! Charts are emitted as self-contained SVG documents; anything that can
//! consume an ordered (label, value) series can replace this sink.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::analysis::location::BucketSummary;

const CHART_WIDTH: u32 = 1200;
const CHART_HEIGHT: u32 = 600;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 60.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_RIGHT: f64 = 30.0;

/// Write both location charts into `dir`, creating it if needed.
/// Returns the paths of (counts chart, mean-ratings chart).
pub fn write_location_charts(dir: &Path, summaries: &[BucketSummary]) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create charts directory '{}'", dir.display()))?;

    let counts: Vec<(String, f64)> = summaries
        .iter()
        .map(|s| (s.label.clone(), s.count as f64))
        .collect();
    let means: Vec<(String, f64)> = summaries
        .iter()
        .map(|s| (s.label.clone(), s.mean_rating.unwrap_or(0.0)))
        .collect();

    let counts_path = dir.join("reviews_by_country.svg");
    let means_path = dir.join("average_ratings_by_country.svg");

    std::fs::write(&counts_path, bar_chart_svg("Number of Reviews by Country", &counts))
        .with_context(|| format!("Failed to write '{}'", counts_path.display()))?;
    std::fs::write(&means_path, bar_chart_svg("Average Rating by Country", &means))
        .with_context(|| format!("Failed to write '{}'", means_path.display()))?;

    Ok((counts_path, means_path))
}

/// Render one vertical bar chart as an SVG document.
fn bar_chart_svg(title: &str, series: &[(String, f64)]) -> String {
    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" fill="white"/>"#,
        CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="{}" y="30" font-family="sans-serif" font-size="20" text-anchor="middle">{}</text>"#,
        CHART_WIDTH / 2,
        escape_xml(title)
    ));
    svg.push('\n');

    let plot_width = CHART_WIDTH as f64 - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT as f64 - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = CHART_HEIGHT as f64 - MARGIN_BOTTOM;

    // Axes
    svg.push_str(&format!(
        r#"<line x1="{x}" y1="{top}" x2="{x}" y2="{bottom}" stroke="black"/>"#,
        x = MARGIN_LEFT,
        top = MARGIN_TOP,
        bottom = baseline
    ));
    svg.push_str(&format!(
        r#"<line x1="{left}" y1="{y}" x2="{right}" y2="{y}" stroke="black"/>"#,
        left = MARGIN_LEFT,
        right = CHART_WIDTH as f64 - MARGIN_RIGHT,
        y = baseline
    ));
    svg.push('\n');

    if series.is_empty() {
        svg.push_str("</svg>\n");
        return svg;
    }

    let max_value = series.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max).max(1e-9);
    let slot = plot_width / series.len() as f64;
    let bar_width = (slot * 0.7).min(80.0);

    for (i, (label, value)) in series.iter().enumerate() {
        let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_width) / 2.0;
        let bar_height = (value / max_value) * plot_height;
        let y = baseline - bar_height;

        svg.push_str(&format!(
            r#"<rect class="bar" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="teal"/>"#,
            x, y, bar_width, bar_height
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="12" text-anchor="middle">{:.2}</text>"#,
            x + bar_width / 2.0,
            y - 5.0,
            value
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="12" text-anchor="middle">{}</text>"#,
            x + bar_width / 2.0,
            baseline + 20.0,
            escape_xml(label)
        ));
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summaries() -> Vec<BucketSummary> {
        vec![
            BucketSummary {
                label: "DE".to_string(),
                count: 5,
                mean_rating: Some(2.0),
            },
            BucketSummary {
                label: "US".to_string(),
                count: 3,
                mean_rating: Some(4.0),
            },
        ]
    }

    #[test]
    fn writes_both_charts_with_shared_bucket_order() {
        let dir = tempfile::tempdir().unwrap();
        let (counts_path, means_path) =
            write_location_charts(dir.path(), &summaries()).unwrap();

        let counts = std::fs::read_to_string(&counts_path).unwrap();
        let means = std::fs::read_to_string(&means_path).unwrap();

        assert!(counts.contains("<svg"));
        assert!(counts.contains("Number of Reviews by Country"));
        assert!(means.contains("Average Rating by Country"));

        // Both series keep the same label order
        let order = |svg: &str| {
            let de = svg.find(">DE<").unwrap();
            let us = svg.find(">US<").unwrap();
            de < us
        };
        assert!(order(&counts));
        assert!(order(&means));
    }

    #[test]
    fn one_bar_per_bucket() {
        let svg = bar_chart_svg("t", &[("A".to_string(), 1.0), ("B".to_string(), 2.0)]);
        assert_eq!(svg.matches(r#"class="bar""#).count(), 2);
    }

    #[test]
    fn empty_series_still_renders_a_document() {
        let svg = bar_chart_svg("empty", &[]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn labels_are_xml_escaped() {
        let svg = bar_chart_svg("t", &[("A&B".to_string(), 1.0)]);
        assert!(svg.contains("A&amp;B"));
        assert!(!svg.contains(">A&B<"));
    }
}
