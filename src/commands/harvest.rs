use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use revharvest::{
    analysis::{
        correlate, sort_reviews, BucketKey, KeywordStats, LocationBuckets, SortKey, SortOrder,
    },
    compliance,
    config::Config,
    harvest::{
        fetcher::session_user_agent, DynamicFetcher, ListingOptions, PageFetcher, PageWalker,
        StaticFetcher,
    },
    output,
    util::{timestamp_slug, truncate_str},
};

/// Which sink formats the run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    Both,
}

impl OutputFormat {
    fn wants_csv(self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }

    fn wants_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }
}

/// Everything one harvesting run needs beyond the config file.
#[derive(Debug)]
pub struct HarvestRequest {
    pub target: String,
    pub options: ListingOptions,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
    pub format: OutputFormat,
    pub retry: bool,
    pub dynamic: bool,
    pub analyze: bool,
    pub visualize: bool,
}

/// Run one harvest: compliance gate, page walk, sort, sinks, analyses.
pub async fn run(config: Config, request: HarvestRequest) -> Result<()> {
    // One user agent per run, shared by the gate and every page fetch
    let mut fetch_config = config.fetch.clone();
    fetch_config.user_agent = Some(session_user_agent(&fetch_config));
    let user_agent = fetch_config.user_agent.clone().unwrap_or_default();

    let target_url = Url::parse(&format!(
        "{}/{}",
        fetch_config.base_url.trim_end_matches('/'),
        request.target
    ))
    .with_context(|| format!("Invalid harvest target '{}'", request.target))?;

    let gate_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(fetch_config.request_timeout_secs))
        .user_agent(&user_agent)
        .build()
        .context("Failed to build HTTP client for the compliance gate")?;

    if !compliance::is_allowed(&gate_client, &target_url, &user_agent).await {
        anyhow::bail!("Harvesting {} is disallowed by robots.txt", target_url);
    }

    info!("Harvesting reviews for {}", request.target);

    let fetcher: Box<dyn PageFetcher> = if request.dynamic {
        Box::new(DynamicFetcher::new(config.browser.clone()))
    } else {
        Box::new(StaticFetcher::new(&fetch_config, request.retry)?)
    };

    let walker = PageWalker::new(fetcher.as_ref(), &fetch_config);
    let outcome = walker.walk(&request.target, &request.options).await;

    if outcome.termination.is_failure() {
        warn!(
            "Harvest ended early ({}); keeping the {} reviews collected so far",
            outcome.termination,
            outcome.reviews.len()
        );
    }

    if outcome.reviews.is_empty() {
        if outcome.termination.is_failure() {
            anyhow::bail!("No reviews scraped: {}", outcome.termination);
        }
        println!("No reviews scraped.");
        return Ok(());
    }

    let mut reviews = outcome.reviews;
    info!("Successfully scraped {} reviews", reviews.len());

    sort_reviews(&mut reviews, request.sort_by, request.sort_order);

    std::fs::create_dir_all(&config.output.dir).with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            config.output.dir.display()
        )
    })?;
    let stamp = timestamp_slug(Utc::now());

    if request.format.wants_csv() {
        let path = config
            .output
            .dir
            .join(format!("reviews_{}_{}.csv", request.target, stamp));
        output::write_reviews_csv(&path, &reviews)?;
        println!("Reviews saved to CSV file {}", path.display());
    }

    if request.format.wants_json() {
        let path = config
            .output
            .dir
            .join(format!("reviews_{}_{}.json", request.target, stamp));
        output::write_reviews_json(&path, &reviews)?;
        println!("Reviews saved to JSON file {}", path.display());
    }

    if request.analyze {
        report_correlations(&config, &request, &reviews, &stamp)?;
    }

    if request.visualize {
        report_locations(&config, &reviews)?;
    }

    println!("\nHarvest complete!");
    println!("=================");
    println!("Pages fetched: {}", outcome.pages_fetched);
    println!("Reviews collected: {}", reviews.len());
    println!("Termination: {}", outcome.termination);

    Ok(())
}

fn report_correlations(
    config: &Config,
    request: &HarvestRequest,
    reviews: &[revharvest::Review],
    stamp: &str,
) -> Result<()> {
    let mut stats = KeywordStats::new();
    for review in reviews {
        stats.observe(review);
    }
    if !stats.is_empty() {
        let path = config
            .output
            .dir
            .join(format!("keywords_{}_{}.csv", request.target, stamp));
        output::write_keywords_csv(&path, &stats.rows())?;
        println!("Keyword analysis saved to {}", path.display());
    }

    let correlations = correlate(reviews, &config.analysis);
    let significant: Vec<_> = correlations
        .iter()
        .filter(|k| k.is_significant(config.analysis.significance_threshold))
        .collect();

    println!("\nKeyword correlation analysis:");
    println!("(negative values indicate lower ratings)");
    println!("{}", "-".repeat(40));

    if significant.is_empty() {
        println!("No statistically significant correlations found");
        return Ok(());
    }

    for keyword in &significant {
        println!(
            "{:<12}: {:>6.3} {} {}",
            truncate_str(&keyword.term, 12),
            keyword.coefficient,
            keyword.strength_marker(),
            keyword.significance_marker()
        );
    }
    println!("\nSignificance: * p<0.05  ** p<0.001  *** p<1e-10");
    println!("Strength: (!) strong  (+) moderate");

    Ok(())
}

fn report_locations(config: &Config, reviews: &[revharvest::Review]) -> Result<()> {
    let buckets = LocationBuckets::collect(reviews, BucketKey::CountryCode);
    if buckets.is_empty() {
        println!("\nNo location data to visualize");
        return Ok(());
    }

    let summaries = buckets.finalize();
    let (counts_path, means_path) =
        output::write_location_charts(&config.output.charts_dir, &summaries)?;

    println!("\nReviews by country:");
    for summary in &summaries {
        match summary.mean_rating {
            Some(mean) => println!(
                "  {:<12} {:>5} reviews, avg rating {:.2}",
                summary.label, summary.count, mean
            ),
            None => println!("  {:<12} {:>5} reviews, no ratings", summary.label, summary.count),
        }
    }
    println!("Charts saved to {} and {}", counts_path.display(), means_path.display());

    Ok(())
}
