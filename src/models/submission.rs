use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::job::Job;
use crate::models::scrape::ScrapedData;

/// Request to scrape a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitScrapeRequest {
    #[garde(length(min = 1, max = 2048), url)]
    pub url: String,
}

/// Response after submitting a URL for scraping.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitScrapeResponse {
    pub job_id: String,
}

/// Response for querying job status.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ScrapeStatusResponse {
    pub id: String,
    pub url: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ScrapedData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Job> for ScrapeStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            url: job.url,
            status: job.status.to_string(),
            result: job.result,
            error: job.error,
        }
    }
}

/// Message body published onto the work queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueuedScrape {
    pub id: String,
    pub url: String,
}
