//! Fetch gateway for listing pages
//!
//! Two interchangeable strategies retrieve rendered page content:
//! - Static fetch (this module): a single HTTP GET per page through a
//!   session-scoped client with a fixed, randomly chosen user agent.
//! - Dynamic fetch ([`super::browser`]): a scripted headless browser
//!   that scrolls until lazy loading is exhausted.
//!
//! A not-found status is a definitive "no such page" signal, not an
//! error. An unexpected cross-parameter redirect aborts the entire run:
//! it usually means the service silently dropped the filtered view.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::FetchConfig;

/// Pool of session user agents; one is drawn per run.
const USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

/// Errors that can occur while fetching a listing page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected redirect from {requested} to {final_url}")]
    UnexpectedRedirect { requested: Url, final_url: Url },
    #[error("render wait exceeded {0:?}")]
    RenderTimeout(Duration),
    #[error("browser session error: {0}")]
    Browser(String),
}

impl FetchError {
    /// Fatal errors abort the run immediately and are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::UnexpectedRedirect { .. })
    }
}

/// Result of a successful page retrieval
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Rendered page content
    Page(String),
    /// The service reported that this page does not exist
    NotFound,
}

/// A strategy for retrieving rendered listing-page content.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_listing(&self, url: &Url) -> Result<FetchOutcome, FetchError>;
}

/// Single-request HTTP fetch through a per-run session client.
pub struct StaticFetcher {
    client: reqwest::Client,
    user_agent: String,
    retry_enabled: bool,
    max_attempts: u32,
    retry_delay_secs: (u64, u64),
}

impl StaticFetcher {
    /// Create a fetcher with a session-scoped client and user agent.
    pub fn new(config: &FetchConfig, retry_enabled: bool) -> Result<Self, FetchError> {
        let user_agent = session_user_agent(config);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(&user_agent)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            user_agent,
            retry_enabled,
            max_attempts: config.max_retry_attempts.max(1),
            retry_delay_secs: config.retry_delay_secs,
        })
    }

    /// The user agent this session presents.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchOutcome, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;
        let final_url = response.url().clone();

        if is_unexpected_redirect(url, &final_url) {
            return Err(FetchError::UnexpectedRedirect {
                requested: url.clone(),
                final_url,
            });
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(FetchOutcome::NotFound);
        }

        let response = response.error_for_status()?;
        Ok(FetchOutcome::Page(response.text().await?))
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch_listing(&self, url: &Url) -> Result<FetchOutcome, FetchError> {
        let attempts = if self.retry_enabled { self.max_attempts } else { 1 };

        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.fetch_once(url).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    if attempt < attempts {
                        let delay_secs = {
                            let mut rng = rand::thread_rng();
                            rng.gen_range(self.retry_delay_secs.0..=self.retry_delay_secs.1)
                        };
                        tracing::warn!(
                            "Fetch attempt {}/{} for {} failed: {}. Retrying in {}s",
                            attempt,
                            attempts,
                            url,
                            e,
                            delay_secs
                        );
                        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        // attempts >= 1, so last_error is set when we get here
        Err(last_error.unwrap_or(FetchError::Browser("no fetch attempt made".to_string())))
    }
}

/// Pick the session user agent: configured override, or a random draw
/// from the pool. Chosen once per run and reused across calls.
pub fn session_user_agent(config: &FetchConfig) -> String {
    config.user_agent.clone().unwrap_or_else(|| {
        USER_AGENT_POOL
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENT_POOL[0])
            .to_string()
    })
}

/// Decompose a URL's query string into a key -> values map.
fn query_params(url: &Url) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        params.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    params
}

/// Redirect guard: the requested query carried more than one parameter
/// and the final query differs.
///
/// A heuristic proxy for anti-scraping redirection. It over-approximates:
/// a legitimate redirect that rewrites a multi-filter query also trips
/// it. Kept as-is deliberately.
pub fn is_unexpected_redirect(requested: &Url, final_url: &Url) -> bool {
    let initial = query_params(requested);
    initial.len() > 1 && initial != query_params(final_url)
}
