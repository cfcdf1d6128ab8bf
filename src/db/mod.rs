//! Durable job store.
//!
//! Jobs live in a key-value store with a fixed retention window measured from
//! the last write. Updates are read-modify-write; each job id is owned by a
//! single worker at a time, so no compare-and-set is attempted.

use async_trait::async_trait;
use chrono::Utc;

use crate::models::job::{Job, JobStatus};
use crate::models::scrape::ScrapedData;

pub mod memory;
pub mod redis_store;

pub use memory::MemoryJobStore;
pub use redis_store::RedisJobStore;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetch the raw record, `None` if unknown or expired.
    async fn load(&self, id: &str) -> Result<Option<Job>, StoreError>;

    /// Persist the record and restart its retention window.
    async fn save(&self, job: &Job) -> Result<(), StoreError>;

    /// Insert a new job in `pending`.
    async fn create_job(&self, id: &str, url: &str) -> Result<Job, StoreError> {
        let job = Job::new(id, url);
        self.save(&job).await?;
        Ok(job)
    }

    async fn get_job(&self, id: &str) -> Result<Job, StoreError> {
        self.load(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_status(&self, id: &str, status: JobStatus) -> Result<(), StoreError> {
        let mut job = self.get_job(id).await?;
        transition(&mut job, status)?;
        self.save(&job).await
    }

    /// Mark the job failed with the given message.
    async fn fail_job(&self, id: &str, message: &str) -> Result<(), StoreError> {
        let mut job = self.get_job(id).await?;
        transition(&mut job, JobStatus::Failed)?;
        job.error = Some(message.to_string());
        self.save(&job).await
    }

    /// Mark the job completed and attach the scraped data.
    async fn update_result(&self, id: &str, data: ScrapedData) -> Result<(), StoreError> {
        let mut job = self.get_job(id).await?;
        transition(&mut job, JobStatus::Completed)?;
        job.result = Some(data);
        job.error = None;
        self.save(&job).await
    }
}

fn transition(job: &mut Job, next: JobStatus) -> Result<(), StoreError> {
    if !job.status.can_transition_to(next) {
        return Err(StoreError::InvalidTransition {
            id: job.id.clone(),
            from: job.status,
            to: next,
        });
    }
    job.status = next;
    job.updated_at = Utc::now();
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("job {0} not found")]
    NotFound(String),

    #[error("job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },
}
