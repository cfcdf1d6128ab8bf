//! Capability seams used by the scrape pipeline.
//!
//! Each trait wraps one external collaborator. Concrete clients live next to
//! the extractor that consumes them; tests substitute their own doubles.

use async_trait::async_trait;

use crate::models::scrape::{BrowserResult, VideoData};
use crate::services::browser::BrowserError;
use crate::services::storage::StorageError;
use crate::services::video::VideoError;

/// Headless page rendering (executes page scripts, can take a screenshot).
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<BrowserResult, BrowserError>;
}

/// Object storage returning a public URL for each upload.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// Structured metadata for video-platform links.
#[async_trait]
pub trait VideoSource: Send + Sync {
    fn is_video_url(&self, url: &str) -> bool;

    async fn get_video_data(&self, url: &str) -> Result<VideoData, VideoError>;
}
