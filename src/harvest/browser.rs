//! Dynamic fetch via a scripted headless browser
//!
//! Drives a Chromium session to the listing address, waits for the
//! review-list container, then scrolls to the bottom in a bounded
//! polling loop until the document height stops growing (lazy loading
//! exhausted). Each attempt owns its own browser session, released on
//! every exit path; failed attempts recreate the session from scratch.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use url::Url;

use super::fetcher::{FetchError, FetchOutcome, PageFetcher};
use crate::config;

/// Selector for the primary review-list container.
const REVIEW_LIST_SELECTOR: &str = ".review-list";

/// Poll interval while waiting for the container to appear.
const CONTAINER_POLL_MS: u64 = 250;

/// Upper bound on scroll steps; lazy loading that never stabilizes
/// within this budget is treated as exhausted.
const MAX_SCROLL_STEPS: u32 = 40;

/// Headless-browser fetch strategy.
pub struct DynamicFetcher {
    config: config::BrowserConfig,
}

impl DynamicFetcher {
    pub fn new(config: config::BrowserConfig) -> Self {
        Self { config }
    }

    /// Launch a fresh browser session, render the page, and tear the
    /// session down again. The session never outlives the call.
    async fn render_with_session(&self, url: &Url) -> Result<String, FetchError> {
        let browser_config = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .window_size(1920, 1080)
            .build()
            .map_err(FetchError::Browser)?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let result = self.drive_page(&browser, url).await;

        // Release the session on success and failure alike
        let _ = browser.close().await;
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }

    async fn drive_page(&self, browser: &Browser, url: &Url) -> Result<String, FetchError> {
        let page = browser
            .new_page(url.as_str())
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        self.wait_for_container(&page).await?;
        self.scroll_until_stable(&page).await?;

        let html: String = page
            .evaluate("document.documentElement.outerHTML")
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?
            .into_value()
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        let _ = page.close().await;
        Ok(html)
    }

    /// Poll for the review-list container within the configured wait
    /// budget.
    async fn wait_for_container(&self, page: &Page) -> Result<(), FetchError> {
        let timeout = Duration::from_secs(self.config.wait_timeout_secs);
        let deadline = Instant::now() + timeout;
        let probe = format!(
            "document.querySelector('{}') !== null",
            REVIEW_LIST_SELECTOR
        );

        loop {
            let present: bool = page
                .evaluate(probe.as_str())
                .await
                .ok()
                .and_then(|v| v.into_value().ok())
                .unwrap_or(false);
            if present {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(FetchError::RenderTimeout(timeout));
            }
            tokio::time::sleep(Duration::from_millis(CONTAINER_POLL_MS)).await;
        }
    }

    /// Scroll to the bottom repeatedly until the document height stops
    /// increasing between settle intervals.
    async fn scroll_until_stable(&self, page: &Page) -> Result<(), FetchError> {
        let settle = Duration::from_millis(self.config.scroll_settle_ms);
        let mut last_height = document_height(page).await?;

        for _ in 0..MAX_SCROLL_STEPS {
            page.evaluate("window.scrollTo(0, document.body.scrollHeight)")
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;
            tokio::time::sleep(settle).await;

            let new_height = document_height(page).await?;
            if new_height <= last_height {
                return Ok(());
            }
            last_height = new_height;
        }

        tracing::debug!("Scroll budget exhausted at height {}", last_height);
        Ok(())
    }
}

async fn document_height(page: &Page) -> Result<i64, FetchError> {
    page.evaluate("document.body.scrollHeight")
        .await
        .map_err(|e| FetchError::Browser(e.to_string()))?
        .into_value()
        .map_err(|e| FetchError::Browser(e.to_string()))
}

#[async_trait]
impl PageFetcher for DynamicFetcher {
    async fn fetch_listing(&self, url: &Url) -> Result<FetchOutcome, FetchError> {
        let mut last_error = None;

        for attempt in 1..=self.config.max_attempts.max(1) {
            match self.render_with_session(url).await {
                Ok(html) => return Ok(FetchOutcome::Page(html)),
                Err(e) => {
                    tracing::warn!(
                        "Render attempt {}/{} for {} failed: {}",
                        attempt,
                        self.config.max_attempts,
                        url,
                        e
                    );
                    if attempt < self.config.max_attempts {
                        tokio::time::sleep(Duration::from_secs(self.config.attempt_delay_secs))
                            .await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetchError::Browser("no render attempt made".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires a local Chromium installation
    async fn render_times_out_without_review_container() {
        let fetcher = DynamicFetcher::new(config::BrowserConfig {
            wait_timeout_secs: 2,
            scroll_settle_ms: 100,
            max_attempts: 1,
            attempt_delay_secs: 0,
        });
        let url = Url::parse("data:text/html,<h1>no reviews here</h1>").unwrap();
        let result = fetcher.fetch_listing(&url).await;
        assert!(matches!(
            result,
            Err(FetchError::RenderTimeout(_)) | Err(FetchError::Browser(_))
        ));
    }
}
