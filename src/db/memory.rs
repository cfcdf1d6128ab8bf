use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{JobStore, StoreError};
use crate::models::job::Job;

/// In-process job store with the same retention semantics as Redis.
///
/// Used by tests and local runs without a Redis instance.
pub struct MemoryJobStore {
    ttl: Duration,
    jobs: Mutex<HashMap<String, (Job, Instant)>>,
}

impl MemoryJobStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (Job, Instant)>> {
        match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(24 * 60 * 60))
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn load(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let mut jobs = self.lock();
        match jobs.get(id) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                jobs.remove(id);
                Ok(None)
            }
            Some((job, _)) => Ok(Some(job.clone())),
            None => Ok(None),
        }
    }

    async fn save(&self, job: &Job) -> Result<(), StoreError> {
        let expires_at = Instant::now() + self.ttl;
        self.lock()
            .insert(job.id.clone(), (job.clone(), expires_at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobStatus;
    use crate::models::scrape::ScrapedData;

    #[tokio::test]
    async fn test_lifecycle_round_trip() {
        let store = MemoryJobStore::default();
        store.create_job("j1", "https://example.com").await.unwrap();
        store.update_status("j1", JobStatus::Processing).await.unwrap();

        let data = ScrapedData {
            url: "https://example.com".into(),
            title: "Example".into(),
            ..Default::default()
        };
        store.update_result("j1", data.clone()).await.unwrap();

        let job = store.get_job("j1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result, Some(data));
        assert_eq!(job.error, None);
    }

    #[tokio::test]
    async fn test_terminal_job_is_not_reopened() {
        let store = MemoryJobStore::default();
        store.create_job("j2", "https://example.com").await.unwrap();
        store.update_status("j2", JobStatus::Processing).await.unwrap();
        store.fail_job("j2", "boom").await.unwrap();

        let err = store
            .update_status("j2", JobStatus::Processing)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        let job = store.get_job("j2").await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = MemoryJobStore::default();
        let err = store.get_job("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_expired_record_disappears() {
        let store = MemoryJobStore::new(Duration::from_millis(10));
        store.create_job("j3", "https://example.com").await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.load("j3").await.unwrap().is_none());
    }
}
