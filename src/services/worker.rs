//! Per-message job lifecycle: parse, mark processing, scrape, persist.

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::db::JobStore;
use crate::models::job::JobStatus;
use crate::models::submission::QueuedScrape;
use crate::services::scraper::Scraper;

pub struct ScrapeWorker {
    store: Arc<dyn JobStore>,
    scraper: Scraper,
}

impl ScrapeWorker {
    pub fn new(store: Arc<dyn JobStore>, scraper: Scraper) -> Self {
        Self { store, scraper }
    }

    /// Process one queue message. Never fails; every problem ends up either
    /// in the job record or in the log, and the caller acknowledges the
    /// message afterwards.
    pub async fn handle(&self, body: &[u8], cancel: &CancellationToken) {
        let msg = match serde_json::from_slice::<QueuedScrape>(body) {
            Ok(msg) if !msg.id.trim().is_empty() && !msg.url.trim().is_empty() => msg,
            Ok(_) => {
                tracing::warn!("Dropping queue message with empty id or url");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed queue message");
                return;
            }
        };

        match self.store.load(&msg.id).await {
            Ok(Some(job)) if job.status.is_terminal() => {
                tracing::info!(job_id = %msg.id, status = %job.status, "Skipping redelivered job");
                return;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(job_id = %msg.id, error = %e, "Failed to load job"),
        }

        tracing::info!(job_id = %msg.id, url = %msg.url, "Processing scrape job");

        if let Err(e) = self.store.update_status(&msg.id, JobStatus::Processing).await {
            tracing::error!(job_id = %msg.id, error = %e, "Failed to mark job processing");
        }

        let start = Instant::now();
        let outcome = self.scraper.scrape(&msg.url, cancel).await;
        metrics::histogram!("scrape_processing_seconds").record(start.elapsed().as_secs_f64());

        match outcome {
            Ok(data) => {
                metrics::counter!("scrape_jobs_completed_total").increment(1);
                match self.store.update_result(&msg.id, data).await {
                    Ok(()) => tracing::info!(
                        job_id = %msg.id,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Job completed"
                    ),
                    Err(e) => {
                        tracing::error!(job_id = %msg.id, error = %e, "Failed to store job result")
                    }
                }
            }
            Err(e) => {
                metrics::counter!("scrape_jobs_failed_total").increment(1);
                tracing::warn!(job_id = %msg.id, url = %msg.url, error = %e, "Scrape failed");
                if let Err(store_err) = self.store.fail_job(&msg.id, &e.to_string()).await {
                    tracing::error!(job_id = %msg.id, error = %store_err, "Failed to mark job failed");
                }
            }
        }
    }
}
