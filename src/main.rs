//! RevHarvest: harvest and analyze consumer reviews from a paginated
//! listing service.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser};
use revharvest::analysis::{SortKey, SortOrder};
use revharvest::config::Config;
use revharvest::harvest::{DateWindow, ListingOptions};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::harvest::{HarvestRequest, OutputFormat};

#[derive(Parser)]
#[command(name = "revharvest")]
#[command(about = "Harvest reviews from a paginated listing service")]
#[command(version)]
struct Cli {
    /// The target domain to harvest reviews for
    target: String,

    /// Configuration file path
    #[arg(short, long, default_value = "revharvest.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Filter reviews by star ratings (e.g. --stars 4 5)
    #[arg(long, num_args = 1..)]
    stars: Vec<u8>,

    /// Filter reviews by date window
    #[arg(long, value_enum)]
    date: Option<CliDateWindow>,

    /// Filter reviews by search keyword
    #[arg(long)]
    search: Option<String>,

    /// Filter reviews by language code ("all" for every language)
    #[arg(long, default_value = "all")]
    languages: String,

    /// Only include verified reviews
    #[arg(long)]
    verified: bool,

    /// Only include reviews with replies
    #[arg(long)]
    replies: bool,

    /// Field to sort the collection by
    #[arg(long, value_enum, default_value_t = CliSortKey::PublishedDate)]
    sort_by: CliSortKey,

    /// Sort direction
    #[arg(long, value_enum, default_value_t = CliSortOrder::Asc)]
    sort_order: CliSortOrder,

    /// Output format
    #[arg(long, value_enum, default_value_t = CliOutputFormat::Csv)]
    output: CliOutputFormat,

    /// Retry failed page fetches with a randomized backoff
    #[arg(long)]
    retry: bool,

    /// Fetch pages through a scrolling headless browser
    #[arg(long)]
    js: bool,

    /// Analyze correlation between ratings and keywords
    #[arg(long)]
    analyze: bool,

    /// Generate per-country review charts
    #[arg(long)]
    visualize: bool,

    /// Override the page-count safety cap
    #[arg(long)]
    max_pages: Option<u32>,
}

/// CLI date window (mirrors DateWindow with clap support)
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliDateWindow {
    #[value(name = "last30days")]
    Last30days,
    #[value(name = "last3months")]
    Last3months,
    #[value(name = "last6months")]
    Last6months,
    #[value(name = "last12months")]
    Last12months,
}

impl From<CliDateWindow> for DateWindow {
    fn from(value: CliDateWindow) -> Self {
        match value {
            CliDateWindow::Last30days => DateWindow::Last30Days,
            CliDateWindow::Last3months => DateWindow::Last3Months,
            CliDateWindow::Last6months => DateWindow::Last6Months,
            CliDateWindow::Last12months => DateWindow::Last12Months,
        }
    }
}

/// CLI sort key (mirrors SortKey with clap support)
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliSortKey {
    PublishedDate,
    ExperiencedDate,
    UpdatedDate,
    Rating,
    Likes,
    ReviewCount,
}

impl From<CliSortKey> for SortKey {
    fn from(value: CliSortKey) -> Self {
        match value {
            CliSortKey::PublishedDate => SortKey::PublishedDate,
            CliSortKey::ExperiencedDate => SortKey::ExperiencedDate,
            CliSortKey::UpdatedDate => SortKey::UpdatedDate,
            CliSortKey::Rating => SortKey::Rating,
            CliSortKey::Likes => SortKey::Likes,
            CliSortKey::ReviewCount => SortKey::ReviewCount,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliSortOrder {
    Asc,
    Desc,
}

impl From<CliSortOrder> for SortOrder {
    fn from(value: CliSortOrder) -> Self {
        match value {
            CliSortOrder::Asc => SortOrder::Ascending,
            CliSortOrder::Desc => SortOrder::Descending,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliOutputFormat {
    Csv,
    Json,
    Both,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(value: CliOutputFormat) -> Self {
        match value {
            CliOutputFormat::Csv => OutputFormat::Csv,
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Both => OutputFormat::Both,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load or create config
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    if let Some(max_pages) = cli.max_pages {
        config.fetch.max_pages = max_pages;
    }

    let options = ListingOptions {
        stars: cli.stars,
        date_window: cli.date.map(DateWindow::from),
        search: cli.search,
        language: cli.languages,
        verified_only: cli.verified,
        replies_only: cli.replies,
    };

    let request = HarvestRequest {
        target: cli.target,
        options,
        sort_by: cli.sort_by.into(),
        sort_order: cli.sort_order.into(),
        format: cli.output.into(),
        retry: cli.retry,
        dynamic: cli.js,
        analyze: cli.analyze,
        visualize: cli.visualize,
    };

    commands::harvest::run(config, request).await
}
