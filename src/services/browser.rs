//! Browser-rendered extraction via a Browserless BrowserQL endpoint.

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::models::scrape::{BrowserResult, ScrapedData};
use crate::services::traits::{ObjectStorage, Renderer};

const RENDER_TIMEOUT: Duration = Duration::from_secs(60);
const SCREENSHOT_CONTENT_TYPE: &str = "image/jpeg";

/// Client for the Browserless `/chromium/bql` endpoint.
pub struct BrowserlessClient {
    http: Client,
    endpoint: String,
    token: String,
}

#[derive(Deserialize)]
struct BqlResponse {
    #[serde(default)]
    data: Option<BqlData>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BqlData {
    #[serde(default)]
    page_text: Option<BqlText>,
    #[serde(default)]
    page_title: Option<BqlText>,
    #[serde(default)]
    shot: Option<BqlShot>,
}

#[derive(Deserialize)]
struct BqlText {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct BqlShot {
    #[serde(default)]
    base64: String,
}

impl BrowserlessClient {
    pub fn new(endpoint: &str, token: &str) -> Result<Self, BrowserError> {
        let http = Client::builder().timeout(RENDER_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn query(target_url: &str) -> String {
        // A JSON string literal is also a valid GraphQL string literal.
        let quoted = serde_json::Value::String(target_url.to_string()).to_string();
        format!(
            r#"mutation Scrape {{
  goto(url: {quoted}) {{
    status
    time
  }}
  pageText: text {{
    text
  }}
  pageTitle: text(selector: "title") {{
    text
  }}
  shot: screenshot(fullPage: false, type: jpeg, quality: 75) {{
    base64
  }}
}}"#
        )
    }
}

#[async_trait]
impl Renderer for BrowserlessClient {
    async fn render(&self, url: &str) -> Result<BrowserResult, BrowserError> {
        let endpoint = format!("{}/chromium/bql", self.endpoint);
        let body = serde_json::json!({ "query": Self::query(url) });

        let response = self
            .http
            .post(&endpoint)
            .query(&[("token", self.token.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(BrowserError::Status(status.as_u16()));
        }

        let parsed: BqlResponse = response.json().await?;
        parse_bql(parsed)
    }
}

fn parse_bql(resp: BqlResponse) -> Result<BrowserResult, BrowserError> {
    if !resp.errors.is_empty() {
        let joined = resp
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(BrowserError::Query(joined));
    }

    let data = resp.data.ok_or_else(|| BrowserError::Query("empty response".to_string()))?;

    // An undecodable screenshot is treated as no screenshot.
    let screenshot = data
        .shot
        .and_then(|s| {
            base64::engine::general_purpose::STANDARD
                .decode(s.base64.trim())
                .ok()
        })
        .unwrap_or_default();

    Ok(BrowserResult {
        title: data.page_title.map(|t| t.text.trim().to_string()).unwrap_or_default(),
        content_text: data.page_text.map(|t| t.text).unwrap_or_default(),
        screenshot,
    })
}

/// Time-derived object key for a page screenshot.
pub fn screenshot_key() -> String {
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1_000);
    format!("screenshots/{nanos}.jpg")
}

/// Render `url` and build a result from the page. A returned screenshot is
/// uploaded and becomes the image; upload failure only leaves the image empty.
pub async fn extract_via_browser(
    renderer: &dyn Renderer,
    storage: Option<&dyn ObjectStorage>,
    url: &str,
) -> Result<ScrapedData, BrowserError> {
    let rendered = renderer.render(url).await?;

    let mut data = ScrapedData {
        url: url.to_string(),
        title: rendered.title,
        content_text: rendered.content_text,
        site_name: "Web".to_string(),
        ..Default::default()
    };

    if rendered.screenshot.is_empty() {
        return Ok(data);
    }

    match storage {
        Some(storage) => {
            let key = screenshot_key();
            match storage
                .upload(&key, &rendered.screenshot, SCREENSHOT_CONTENT_TYPE)
                .await
            {
                Ok(public_url) => data.image_url = public_url,
                Err(e) => tracing::error!(url = %url, key = %key, error = %e, "Failed to upload screenshot"),
            }
        }
        None => tracing::debug!(url = %url, "No object storage configured, dropping screenshot"),
    }

    Ok(data)
}

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("browserless request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browserless error code: {0}")]
    Status(u16),

    #[error("browserql execution error: {0}")]
    Query(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_escapes_url() {
        let q = BrowserlessClient::query(r#"https://example.com/?q="x""#);
        assert!(q.contains(r#"goto(url: "https://example.com/?q=\"x\"")"#));
        assert!(q.contains("screenshot(fullPage: false, type: jpeg, quality: 75)"));
    }

    #[test]
    fn test_parse_bql_success() {
        let raw = serde_json::json!({
            "data": {
                "goto": { "status": 200, "time": 812.0 },
                "pageText": { "text": "Body text" },
                "pageTitle": { "text": "  Title  " },
                "shot": { "base64": "aGVsbG8=" }
            }
        });
        let result = parse_bql(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(result.title, "Title");
        assert_eq!(result.content_text, "Body text");
        assert_eq!(result.screenshot, b"hello");
    }

    #[test]
    fn test_parse_bql_errors() {
        let raw = serde_json::json!({
            "data": null,
            "errors": [{ "message": "navigation timeout" }]
        });
        let err = parse_bql(serde_json::from_value(raw).unwrap()).unwrap_err();
        assert!(matches!(err, BrowserError::Query(msg) if msg.contains("navigation timeout")));
    }

    #[test]
    fn test_bad_screenshot_is_dropped() {
        let raw = serde_json::json!({
            "data": {
                "pageText": { "text": "t" },
                "pageTitle": { "text": "x" },
                "shot": { "base64": "%%%not-base64" }
            }
        });
        let result = parse_bql(serde_json::from_value(raw).unwrap()).unwrap();
        assert!(result.screenshot.is_empty());
    }

    #[test]
    fn test_screenshot_key_shape() {
        let key = screenshot_key();
        assert!(key.starts_with("screenshots/"));
        assert!(key.ends_with(".jpg"));
    }
}
