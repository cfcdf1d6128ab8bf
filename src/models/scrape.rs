use serde::{Deserialize, Serialize};

/// Structured content extracted from a single URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapedData {
    pub url: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub site_name: String,
    pub content_text: String,
    pub author: String,
    pub published_at: String,
}

impl ScrapedData {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// True when at least one of title, content or description carries text.
    pub fn has_any_text(&self) -> bool {
        !self.title.trim().is_empty()
            || !self.content_text.trim().is_empty()
            || !self.description.trim().is_empty()
    }
}

/// Output of the headless rendering capability.
#[derive(Debug, Clone, Default)]
pub struct BrowserResult {
    pub title: String,
    pub content_text: String,
    pub screenshot: Vec<u8>,
}

/// Metadata and transcript for a video-platform link.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoData {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub channel_id: String,
    pub published_at: String,
    pub thumbnail_url: String,
    pub duration: String,
    pub view_count: String,
    pub like_count: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}
