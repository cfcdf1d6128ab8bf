//! YouTube metadata and transcript extraction.

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt::Write;
use std::sync::OnceLock;
use std::time::Duration;

use crate::models::scrape::{ScrapedData, VideoData};
use crate::services::classifier;
use crate::services::traits::VideoSource;

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const TRANSCRIPT_ENDPOINT: &str = "https://www.youtube.com/api/timedtext";

/// Transcript languages in preference order; the empty code asks for the default track.
const TRANSCRIPT_LANGS: &[&str] = &["en", "en-US", "en-GB", ""];

const TRANSCRIPT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

static TEXT_NODE: OnceLock<Regex> = OnceLock::new();

/// Client for the YouTube Data API v3 and the timed-text endpoint.
pub struct YouTubeClient {
    http: Client,
    api_key: String,
}

#[derive(Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
    #[serde(default)]
    content_details: ContentDetails,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Snippet {
    title: String,
    description: String,
    channel_title: String,
    channel_id: String,
    published_at: String,
    thumbnails: Thumbnails,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Thumbnails {
    maxres: Option<Thumbnail>,
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Thumbnail {
    url: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Statistics {
    view_count: String,
    like_count: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ContentDetails {
    duration: String,
}

impl Thumbnails {
    fn best(&self) -> String {
        [&self.maxres, &self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .map(|t| t.url.as_str())
            .find(|url| !url.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

impl YouTubeClient {
    pub fn new(api_key: &str) -> Result<Self, VideoError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(15))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
        })
    }

    async fn fetch_video_details(&self, video_id: &str) -> Result<VideoData, VideoError> {
        let endpoint = format!("{YOUTUBE_API_BASE}/videos");
        let response = self
            .http
            .get(&endpoint)
            .query(&[
                ("part", "snippet,statistics,contentDetails"),
                ("id", video_id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(VideoError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let list: VideoListResponse = response.json().await?;
        let item = list
            .items
            .into_iter()
            .next()
            .ok_or_else(|| VideoError::NotFound(video_id.to_string()))?;

        Ok(VideoData {
            video_id: video_id.to_string(),
            thumbnail_url: item.snippet.thumbnails.best(),
            title: item.snippet.title,
            description: item.snippet.description,
            channel_title: item.snippet.channel_title,
            channel_id: item.snippet.channel_id,
            published_at: item.snippet.published_at,
            duration: item.content_details.duration,
            view_count: item.statistics.view_count,
            like_count: item.statistics.like_count,
            transcript: None,
        })
    }

    /// Try each preferred language in turn; `None` when no track yields text.
    async fn fetch_transcript(&self, video_id: &str) -> Option<String> {
        for &lang in TRANSCRIPT_LANGS {
            let response = self
                .http
                .get(TRANSCRIPT_ENDPOINT)
                .header(reqwest::header::USER_AGENT, TRANSCRIPT_USER_AGENT)
                .query(&[("v", video_id), ("lang", lang), ("fmt", "srv3")])
                .send()
                .await;

            let body = match response {
                Ok(resp) if resp.status() == StatusCode::OK => resp.text().await.ok(),
                Ok(resp) => {
                    tracing::debug!(video_id, lang, status = %resp.status(), "No transcript track");
                    None
                }
                Err(e) => {
                    tracing::debug!(video_id, lang, error = %e, "Transcript request failed");
                    None
                }
            };

            if let Some(transcript) = body.map(|b| parse_transcript_xml(&b)) {
                if !transcript.is_empty() {
                    return Some(transcript);
                }
            }
        }

        tracing::debug!(video_id, "No transcript available");
        None
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    fn is_video_url(&self, url: &str) -> bool {
        classifier::is_video_url(url)
    }

    async fn get_video_data(&self, url: &str) -> Result<VideoData, VideoError> {
        let video_id = classifier::extract_video_id(url)
            .ok_or_else(|| VideoError::InvalidUrl(url.to_string()))?;

        let mut video = self.fetch_video_details(&video_id).await?;
        video.transcript = self.fetch_transcript(&video_id).await;
        Ok(video)
    }
}

/// Join the `<text>` nodes of a timed-text document into one line of prose.
pub fn parse_transcript_xml(xml: &str) -> String {
    let pattern = TEXT_NODE
        .get_or_init(|| Regex::new(r"<text[^>]*>([^<]*)</text>").expect("valid regex"));

    pattern
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            html_escape::decode_html_entities(m.as_str())
                .replace(|c: char| c == '\n' || c == '\r', " ")
                .trim()
                .to_string()
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the scrape result for a video, with the metadata and transcript
/// rendered as plain-text sections in `content_text`.
pub fn video_to_scraped(url: &str, video: &VideoData) -> ScrapedData {
    let mut content = String::new();
    let _ = write!(content, "Title: {}\n\n", video.title);
    let _ = writeln!(content, "Channel: {}", video.channel_title);
    let _ = writeln!(content, "Published: {}", video.published_at);
    for (label, value) in [
        ("Duration", &video.duration),
        ("Views", &video.view_count),
        ("Likes", &video.like_count),
    ] {
        if !value.is_empty() {
            let _ = writeln!(content, "{label}: {value}");
        }
    }
    let _ = write!(content, "\nDescription:\n{}\n", video.description);
    if let Some(transcript) = video.transcript.as_deref().filter(|t| !t.is_empty()) {
        let _ = write!(content, "\nTranscript:\n{transcript}");
    }

    ScrapedData {
        url: url.to_string(),
        title: video.title.clone(),
        description: video.description.clone(),
        image_url: video.thumbnail_url.clone(),
        site_name: "YouTube".to_string(),
        content_text: content,
        author: video.channel_title.clone(),
        published_at: video.published_at.clone(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("could not extract video ID from URL: {0}")]
    InvalidUrl(String),

    #[error("YouTube API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("video not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_video() -> VideoData {
        VideoData {
            video_id: "dQw4w9WgXcQ".into(),
            title: "Never Gonna Give You Up".into(),
            description: "Official video".into(),
            channel_title: "Rick Astley".into(),
            channel_id: "UCuAXFkgsw1L7xaCfnd5JJOw".into(),
            published_at: "2009-10-25T06:57:33Z".into(),
            thumbnail_url: "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg".into(),
            duration: "PT3M33S".into(),
            view_count: "1500000000".into(),
            like_count: String::new(),
            transcript: Some("We're no strangers to love".into()),
        }
    }

    #[test]
    fn test_content_sections_in_order() {
        let data = video_to_scraped("https://youtu.be/dQw4w9WgXcQ", &sample_video());
        assert_eq!(
            data.content_text,
            "Title: Never Gonna Give You Up\n\n\
             Channel: Rick Astley\n\
             Published: 2009-10-25T06:57:33Z\n\
             Duration: PT3M33S\n\
             Views: 1500000000\n\
             \nDescription:\nOfficial video\n\
             \nTranscript:\nWe're no strangers to love"
        );
        assert_eq!(data.site_name, "YouTube");
        assert_eq!(data.author, "Rick Astley");
        assert_eq!(data.image_url, sample_video().thumbnail_url);
    }

    #[test]
    fn test_content_without_transcript() {
        let mut video = sample_video();
        video.transcript = None;
        let data = video_to_scraped("https://youtu.be/dQw4w9WgXcQ", &video);
        assert!(data.content_text.ends_with("\nDescription:\nOfficial video\n"));
        assert!(!data.content_text.contains("Transcript"));
    }

    #[test]
    fn test_parse_transcript_xml() {
        let xml = r#"<?xml version="1.0"?><transcript>
            <text start="0.1" dur="2.0">We&#39;re no strangers</text>
            <text start="2.1" dur="2.0">to love&#xA;you know</text>
            <text start="4.0" dur="1.0">   </text>
            <text start="5.0" dur="1.0">rules &amp; so do I</text>
        </transcript>"#;
        assert_eq!(
            parse_transcript_xml(xml),
            "We're no strangers to love you know rules & so do I"
        );
    }

    #[test]
    fn test_best_thumbnail_order() {
        let thumbs = Thumbnails {
            maxres: Some(Thumbnail { url: String::new() }),
            high: None,
            medium: Some(Thumbnail {
                url: "https://i.ytimg.com/medium.jpg".into(),
            }),
            default: Some(Thumbnail {
                url: "https://i.ytimg.com/default.jpg".into(),
            }),
        };
        assert_eq!(thumbs.best(), "https://i.ytimg.com/medium.jpg");
    }

    #[test]
    fn test_video_list_deserializes_partial_payload() {
        let raw = r#"{"items":[{"snippet":{"title":"T","channelTitle":"C",
            "thumbnails":{"high":{"url":"https://i.ytimg.com/hq.jpg"}}},
            "statistics":{"viewCount":"10"}}]}"#;
        let list: VideoListResponse = serde_json::from_str(raw).unwrap();
        let item = &list.items[0];
        assert_eq!(item.snippet.channel_title, "C");
        assert_eq!(item.snippet.thumbnails.best(), "https://i.ytimg.com/hq.jpg");
        assert_eq!(item.statistics.view_count, "10");
        assert_eq!(item.content_details.duration, "");
    }
}
