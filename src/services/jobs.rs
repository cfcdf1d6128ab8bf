//! Submission and status queries for scrape jobs.

use garde::Validate;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{JobStore, StoreError};
use crate::error::ScrapeError;
use crate::models::submission::{QueuedScrape, ScrapeStatusResponse, SubmitScrapeRequest};
use crate::services::queue::{QueueError, WorkQueue};

const ENQUEUE_FAILED: &str = "failed to enqueue job";

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn WorkQueue>,
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>, queue: Arc<dyn WorkQueue>) -> Self {
        Self { store, queue }
    }

    /// Validate the URL, record a pending job and publish it. Returns the
    /// new job id.
    pub async fn submit(&self, request: SubmitScrapeRequest) -> Result<String, ScrapeError> {
        let request = SubmitScrapeRequest {
            url: request.url.trim().to_string(),
        };
        request
            .validate()
            .map_err(|e| ScrapeError::Validation(e.to_string()))?;
        check_scheme(&request.url)?;

        let id = Uuid::new_v4().to_string();
        self.store.create_job(&id, &request.url).await?;

        let payload = serde_json::to_vec(&QueuedScrape {
            id: id.clone(),
            url: request.url.clone(),
        })
        .map_err(QueueError::from)?;

        if let Err(e) = self.queue.publish(&payload).await {
            tracing::error!(job_id = %id, error = %e, "Failed to publish job");
            if let Err(store_err) = self.store.fail_job(&id, ENQUEUE_FAILED).await {
                tracing::error!(job_id = %id, error = %store_err, "Failed to mark job failed");
            }
            return Err(e.into());
        }

        metrics::counter!("scrape_jobs_submitted_total").increment(1);
        tracing::info!(job_id = %id, url = %request.url, "Scrape job submitted");

        Ok(id)
    }

    pub async fn status(&self, id: &str) -> Result<ScrapeStatusResponse, ScrapeError> {
        match self.store.get_job(id).await {
            Ok(job) => Ok(job.into()),
            Err(StoreError::NotFound(id)) => Err(ScrapeError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_scheme(raw: &str) -> Result<(), ScrapeError> {
    let parsed = url::Url::parse(raw).map_err(|e| ScrapeError::Validation(format!("url: {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        scheme => Err(ScrapeError::Validation(format!(
            "url: unsupported scheme or missing host ({scheme})"
        ))),
    }
}
