use async_trait::async_trait;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const QUEUE_KEY: &str = "scrape:jobs";
const PROCESSING_KEY: &str = "scrape:processing";

/// How long one blocking pop waits before the slot re-checks for shutdown.
const BLOCK_SECS: u64 = 5;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Producer side of the work queue.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    async fn publish(&self, payload: &[u8]) -> Result<(), QueueError>;
}

/// Redis list queue. Delivered messages sit in a processing list until
/// acknowledged, so a crashed worker's messages can be recovered.
pub struct JobQueue {
    client: redis::Client,
}

impl JobQueue {
    pub fn new(redis_url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, QueueError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Block up to [`BLOCK_SECS`] for the next message, moving it to the
    /// processing list.
    pub async fn dequeue(&self) -> Result<Option<Vec<u8>>, QueueError> {
        let mut conn = self.connection().await?;
        let payload: Option<Vec<u8>> = redis::cmd("BRPOPLPUSH")
            .arg(QUEUE_KEY)
            .arg(PROCESSING_KEY)
            .arg(BLOCK_SECS)
            .query_async(&mut conn)
            .await?;
        Ok(payload)
    }

    /// Remove a delivered message from the processing list.
    pub async fn ack(&self, payload: &[u8]) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        conn.lrem::<_, _, ()>(PROCESSING_KEY, 1, payload).await?;
        Ok(())
    }

    /// Move every unacknowledged message back onto the queue. Only safe
    /// while no other consumer is running.
    pub async fn recover_inflight(&self) -> Result<u64, QueueError> {
        let mut conn = self.connection().await?;
        let mut recovered = 0;
        loop {
            let moved: Option<Vec<u8>> = conn.rpoplpush(PROCESSING_KEY, QUEUE_KEY).await?;
            if moved.is_none() {
                break;
            }
            recovered += 1;
        }
        Ok(recovered)
    }

    /// Run one consumer slot until `cancel` fires. Every delivered message is
    /// acknowledged after `handler` returns, whatever the outcome.
    pub async fn consume<F, Fut>(&self, slot: usize, cancel: CancellationToken, handler: F)
    where
        F: Fn(Vec<u8>) -> Fut,
        Fut: Future<Output = ()>,
    {
        tracing::info!(slot, "Consumer slot started");

        while !cancel.is_cancelled() {
            let next = tokio::select! {
                next = self.dequeue() => next,
                _ = cancel.cancelled() => break,
            };

            let payload = match next {
                Ok(Some(payload)) => payload,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(slot, error = %e, "Dequeue failed, will retry");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            handler(payload.clone()).await;

            if let Err(e) = self.ack(&payload).await {
                tracing::error!(slot, error = %e, "Failed to acknowledge message");
            }
        }

        tracing::info!(slot, "Consumer slot stopped");
    }

    /// Check Redis connectivity (for health checks).
    pub async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    /// Messages waiting to be delivered.
    pub async fn queue_depth(&self) -> Result<u64, QueueError> {
        let mut conn = self.connection().await?;
        let depth: u64 = conn.llen(QUEUE_KEY).await?;
        Ok(depth)
    }
}

#[async_trait]
impl WorkQueue for JobQueue {
    async fn publish(&self, payload: &[u8]) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, payload).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
