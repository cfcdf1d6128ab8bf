use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;

use super::{JobStore, StoreError};
use crate::models::job::Job;

const KEY_PREFIX: &str = "scrape:job:";

/// Redis-backed job store; every write sets the key's TTL.
pub struct RedisJobStore {
    client: redis::Client,
    ttl: Duration,
}

impl RedisJobStore {
    pub fn new(redis_url: &str, ttl: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url).map_err(StoreError::Redis)?;
        Ok(Self { client, ttl })
    }

    fn key(id: &str) -> String {
        format!("{KEY_PREFIX}{id}")
    }

    /// Check Redis connectivity (for health checks).
    pub async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn load(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(Self::key(id)).await?;

        match raw {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, job: &Job) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(job)?;
        redis::cmd("SET")
            .arg(Self::key(&job.id))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }
}
