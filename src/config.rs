//! Configuration for RevHarvest

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Base address of the review-listing service.
pub const DEFAULT_BASE_URL: &str = "https://www.trustpilot.com/review";

/// Main configuration for a harvesting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Fetch gateway configuration
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Headless-browser (dynamic fetch) configuration
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Analysis configuration
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Output sink configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP fetching and pagination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Listing service base URL
    pub base_url: String,
    /// Request timeout (seconds)
    pub request_timeout_secs: u64,
    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,
    /// Maximum fetch attempts per page when retry mode is enabled
    pub max_retry_attempts: u32,
    /// Randomized delay between failed attempts (seconds, inclusive bounds)
    pub retry_delay_secs: (u64, u64),
    /// Randomized delay between consecutive page fetches (milliseconds,
    /// inclusive bounds)
    pub page_delay_ms: (u64, u64),
    /// Safety cap on pages walked in one run
    pub max_pages: u32,
    /// Fixed user agent; when unset, one is drawn from the built-in pool
    /// for the whole run
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retry_attempts: 3,
            retry_delay_secs: (1, 3),
            page_delay_ms: (500, 1000),
            max_pages: 1000,
            user_agent: None,
        }
    }
}

/// Dynamic-fetch (headless browser) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Maximum wait for the review-list container to appear (seconds)
    pub wait_timeout_secs: u64,
    /// Settle interval between scroll steps (milliseconds)
    pub scroll_settle_ms: u64,
    /// Maximum render attempts, each with a fresh browser session
    pub max_attempts: u32,
    /// Constant delay between render attempts (seconds)
    pub attempt_delay_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 10,
            scroll_settle_ms: 2000,
            max_attempts: 3,
            attempt_delay_secs: 2,
        }
    }
}

/// Keyword correlation analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Vocabulary size cap (terms selected by document frequency)
    pub max_vocabulary: usize,
    /// Number of top-ranked correlations to report
    pub top_correlations: usize,
    /// Two-sided p-value threshold for reporting a term as significant
    pub significance_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_vocabulary: 50,
            top_correlations: 10,
            significance_threshold: 0.05,
        }
    }
}

/// Output sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for review/keyword files
    pub dir: PathBuf,
    /// Directory for chart images
    pub charts_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            charts_dir: PathBuf::from("charts"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            browser: BrowserConfig::default(),
            analysis: AnalysisConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the
    /// user can fix everything in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.fetch.base_url.is_empty() {
            errors.push("fetch.base_url must not be empty".to_string());
        }
        if url::Url::parse(&self.fetch.base_url).is_err() {
            errors.push(format!(
                "fetch.base_url is not a valid URL: '{}'",
                self.fetch.base_url
            ));
        }
        if self.fetch.request_timeout_secs == 0 {
            errors.push("fetch.request_timeout_secs must be positive".to_string());
        }
        if self.fetch.max_retry_attempts == 0 {
            errors.push("fetch.max_retry_attempts must be positive".to_string());
        }
        if self.fetch.retry_delay_secs.0 > self.fetch.retry_delay_secs.1 {
            errors.push("fetch.retry_delay_secs bounds must be ordered".to_string());
        }
        if self.fetch.page_delay_ms.0 > self.fetch.page_delay_ms.1 {
            errors.push("fetch.page_delay_ms bounds must be ordered".to_string());
        }
        if self.fetch.max_pages == 0 {
            errors.push("fetch.max_pages must be positive".to_string());
        }

        if self.browser.wait_timeout_secs == 0 {
            errors.push("browser.wait_timeout_secs must be positive".to_string());
        }
        if self.browser.max_attempts == 0 {
            errors.push("browser.max_attempts must be positive".to_string());
        }

        if self.analysis.max_vocabulary == 0 {
            errors.push("analysis.max_vocabulary must be positive".to_string());
        }
        if self.analysis.top_correlations == 0 {
            errors.push("analysis.top_correlations must be positive".to_string());
        }
        if self.analysis.significance_threshold <= 0.0 || self.analysis.significance_threshold >= 1.0
        {
            errors.push(
                "analysis.significance_threshold must be between 0.0 and 1.0 (exclusive)"
                    .to_string(),
            );
        }

        if self.output.dir.as_os_str().is_empty() {
            errors.push("output.dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_max_pages() {
        let mut cfg = Config::default();
        cfg.fetch.max_pages = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_pages must be positive"));
    }

    #[test]
    fn validate_rejects_unordered_delay_bounds() {
        let mut cfg = Config::default();
        cfg.fetch.page_delay_ms = (1000, 500);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("page_delay_ms bounds must be ordered"));
    }

    #[test]
    fn validate_rejects_invalid_base_url() {
        let mut cfg = Config::default();
        cfg.fetch.base_url = "not a url".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("not a valid URL"));
    }

    #[test]
    fn validate_rejects_out_of_range_significance() {
        let mut cfg = Config::default();
        cfg.analysis.significance_threshold = 1.5;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("significance_threshold"));
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let mut cfg = Config::default();
        cfg.fetch.max_pages = 0;
        cfg.analysis.max_vocabulary = 0;
        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("max_pages must be positive"));
        assert!(msg.contains("max_vocabulary must be positive"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let cfg = Config::default();
        let text = toml::to_string(&cfg).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.fetch.max_pages, cfg.fetch.max_pages);
        assert_eq!(back.analysis.max_vocabulary, cfg.analysis.max_vocabulary);
    }
}
