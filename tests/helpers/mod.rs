//! Shared test doubles and local servers.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scrape_jobs::models::scrape::{BrowserResult, VideoData};
use scrape_jobs::services::browser::BrowserError;
use scrape_jobs::services::queue::{QueueError, WorkQueue};
use scrape_jobs::services::storage::StorageError;
use scrape_jobs::services::traits::{ObjectStorage, Renderer, VideoSource};
use scrape_jobs::services::video::VideoError;

use crate::fixtures::*;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_app(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server error");
    });
    format!("http://{addr}")
}

/// Local site serving the HTML fixtures.
pub async fn spawn_fixture_site() -> String {
    let router = Router::new()
        .route("/article", get(|| async { Html(ARTICLE_PAGE) }))
        .route("/no-image", get(|| async { Html(NO_IMAGE_PAGE) }))
        .route("/thin", get(|| async { Html(THIN_PAGE) }))
        .route("/empty", get(|| async { Html(EMPTY_PAGE) }))
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "not here") }),
        );
    spawn_app(router).await
}

#[derive(Clone, Copy)]
pub enum RenderMode {
    /// Title, text and a small screenshot.
    Succeed,
    /// Title and text, no screenshot.
    NoScreenshot,
    Fail,
    /// Never finishes in test time.
    Hang,
}

/// Renderer double counting its calls.
pub struct MockRenderer {
    mode: RenderMode,
    pub calls: AtomicUsize,
}

impl MockRenderer {
    pub fn new(mode: RenderMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn render(&self, _url: &str) -> Result<BrowserResult, BrowserError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            RenderMode::Succeed => Ok(BrowserResult {
                title: RENDERED_TITLE.to_string(),
                content_text: RENDERED_TEXT.to_string(),
                screenshot: vec![0xFF, 0xD8, 0xFF, 0xE0],
            }),
            RenderMode::NoScreenshot => Ok(BrowserResult {
                title: RENDERED_TITLE.to_string(),
                content_text: RENDERED_TEXT.to_string(),
                screenshot: Vec::new(),
            }),
            RenderMode::Fail => Err(BrowserError::Status(502)),
            RenderMode::Hang => {
                tokio::time::sleep(Duration::from_secs(600)).await;
                Err(BrowserError::Status(504))
            }
        }
    }
}

/// Object storage double recording uploaded keys.
pub struct MockStorage {
    fail: bool,
    pub uploads: Mutex<Vec<(String, String)>>,
}

impl MockStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            uploads: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            uploads: Mutex::new(Vec::new()),
        })
    }

    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn upload(
        &self,
        key: &str,
        _data: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        if self.fail {
            return Err(StorageError::Status(503));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.to_string()));
        Ok(format!("https://cdn.test/{key}"))
    }
}

/// Video source double treating any `youtube.test` URL as a video.
pub struct MockVideo {
    fail: bool,
    pub calls: AtomicUsize,
}

impl MockVideo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn sample_video() -> VideoData {
    VideoData {
        video_id: "abc123DEF45".into(),
        title: "Designing Work Queues".into(),
        description: "A talk about at-least-once delivery.".into(),
        channel_title: "Systems Talks".into(),
        channel_id: "UC_systems".into(),
        published_at: "2023-11-02T17:00:00Z".into(),
        thumbnail_url: "https://i.ytimg.test/vi/abc123DEF45/hqdefault.jpg".into(),
        duration: "PT41M12S".into(),
        view_count: "12345".into(),
        like_count: "678".into(),
        transcript: Some("welcome everyone".into()),
    }
}

#[async_trait]
impl VideoSource for MockVideo {
    fn is_video_url(&self, url: &str) -> bool {
        url.contains("youtube.test")
    }

    async fn get_video_data(&self, _url: &str) -> Result<VideoData, VideoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(VideoError::NotFound("abc123DEF45".to_string()));
        }
        Ok(sample_video())
    }
}

/// Work queue double keeping every published payload.
pub struct RecordingQueue {
    fail: bool,
    pub published: Mutex<Vec<Vec<u8>>>,
}

impl RecordingQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            published: Mutex::new(Vec::new()),
        })
    }

    /// Records the payload, then reports a broker failure.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            published: Mutex::new(Vec::new()),
        })
    }

    pub fn published(&self) -> Vec<Vec<u8>> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkQueue for RecordingQueue {
    async fn publish(&self, payload: &[u8]) -> Result<(), QueueError> {
        self.published.lock().unwrap().push(payload.to_vec());
        if self.fail {
            return Err(QueueError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "broker unavailable",
            ))));
        }
        Ok(())
    }
}
