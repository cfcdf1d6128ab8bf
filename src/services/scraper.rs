//! Strategy selection for a single URL.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::ScrapeError;
use crate::models::scrape::ScrapedData;
use crate::services::browser::{extract_via_browser, BrowserError};
use crate::services::evaluate::evaluate;
use crate::services::static_extract::scrape_static;
use crate::services::traits::{ObjectStorage, Renderer, VideoSource};
use crate::services::video::video_to_scraped;

const OUTCOMES_METRIC: &str = "scrape_outcomes_total";

/// Runs the video, static and browser strategies for a URL.
///
/// Every capability is optional; a scraper with none configured only does
/// static extraction.
#[derive(Clone)]
pub struct Scraper {
    http: Client,
    browser: Option<Arc<dyn Renderer>>,
    storage: Option<Arc<dyn ObjectStorage>>,
    video: Option<Arc<dyn VideoSource>>,
}

impl Scraper {
    pub fn new(http_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(http_timeout).build()?;

        Ok(Self::with_client(http))
    }

    pub fn with_client(http: Client) -> Self {
        Self {
            http,
            browser: None,
            storage: None,
            video: None,
        }
    }

    pub fn with_browser(mut self, browser: Arc<dyn Renderer>) -> Self {
        self.browser = Some(browser);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_video(mut self, video: Arc<dyn VideoSource>) -> Self {
        self.video = Some(video);
        self
    }

    pub async fn scrape(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ScrapedData, ScrapeError> {
        if let Some(video) = self.video.as_deref().filter(|v| v.is_video_url(url)) {
            tracing::info!(url = %url, "Using video extractor");
            let fetched = tokio::select! {
                fetched = video.get_video_data(url) => fetched,
                _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
            };
            let data = fetched.map(|v| video_to_scraped(url, &v));
            record_outcome(if data.is_ok() { "video" } else { "video_error" });
            return Ok(data?);
        }

        let mut insufficient_reason = None;
        let static_result = match scrape_static(&self.http, url, cancel).await {
            Ok(mut data) => {
                let evaluation = evaluate(Some(&data));
                if evaluation.ok {
                    if evaluation.needs_screenshot && self.browser.is_some() {
                        self.backfill_image(url, &mut data, cancel).await?;
                    }
                    record_outcome("static");
                    return Ok(data);
                }
                let reason = evaluation.reason();
                tracing::info!(url = %url, reason = %reason, "Static result insufficient");
                insufficient_reason = Some(reason);
                Ok(data)
            }
            Err(ScrapeError::Cancelled) => return Err(ScrapeError::Cancelled),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Static extraction failed");
                Err(e)
            }
        };

        if self.browser.is_some() {
            match self.browse(url, cancel).await {
                Ok(data) => {
                    record_outcome("browser");
                    return Ok(data);
                }
                Err(ScrapeError::Cancelled) => return Err(ScrapeError::Cancelled),
                Err(e) => tracing::warn!(url = %url, error = %e, "Browser extraction failed"),
            }
        }

        match static_result {
            Err(e) => {
                record_outcome("failed");
                Err(e)
            }
            Ok(data) if data.has_any_text() => {
                record_outcome("static_degraded");
                Ok(data)
            }
            Ok(_) => {
                record_outcome("insufficient");
                Err(ScrapeError::InsufficientContent(
                    insufficient_reason.unwrap_or_else(|| "no usable content".to_string()),
                ))
            }
        }
    }

    /// Render the page only to borrow its screenshot as the image.
    async fn backfill_image(
        &self,
        url: &str,
        data: &mut ScrapedData,
        cancel: &CancellationToken,
    ) -> Result<(), ScrapeError> {
        match self.browse(url, cancel).await {
            Ok(rendered) if !rendered.image_url.is_empty() => {
                tracing::debug!(url = %url, "Using browser screenshot as image");
                data.image_url = rendered.image_url;
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(ScrapeError::Cancelled) => Err(ScrapeError::Cancelled),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Screenshot backfill failed");
                Ok(())
            }
        }
    }

    async fn browse(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ScrapedData, ScrapeError> {
        let Some(browser) = self.browser.as_deref() else {
            return Err(BrowserError::Query("no renderer configured".to_string()).into());
        };

        tokio::select! {
            rendered = extract_via_browser(browser, self.storage.as_deref(), url) => Ok(rendered?),
            _ = cancel.cancelled() => Err(ScrapeError::Cancelled),
        }
    }
}

fn record_outcome(strategy: &'static str) {
    metrics::counter!(OUTCOMES_METRIC, "strategy" => strategy).increment(1);
}
