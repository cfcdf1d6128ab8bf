//! Static (no script execution) extraction from fetched HTML.
//!
//! Two independent passes run on the blocking pool over the same immutable
//! buffer: a readability pass for the article body and byline, and a metadata
//! pass for description, image and fallbacks. Both write into one shared
//! record under a mutex.

use readability::extractor;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT};
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ScrapeError;
use crate::models::scrape::ScrapedData;
use crate::services::image::{extract_image, find_meta};

/// Response bodies beyond this size are truncated.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const DESCRIPTION_TAGS: &[&str] = &["og:description", "twitter:description", "description"];
const TITLE_TAGS: &[&str] = &["og:title", "twitter:title", "title"];
const SITE_NAME_TAGS: &[&str] = &["og:site_name", "application-name"];
const PUBLISHED_TAGS: &[&str] = &["article:published_time", "og:published_time"];

const BYLINE_SELECTORS: &[&str] = &[
    r#"[rel="author"]"#,
    r#"[itemprop="author"]"#,
    ".byline",
    ".author",
];

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers
}

/// GET the page with browser-like headers, capped at [`MAX_BODY_BYTES`].
pub async fn fetch_html(http: &Client, url: &str) -> Result<Vec<u8>, ScrapeError> {
    let mut response = http
        .get(url)
        .headers(browser_headers())
        .send()
        .await
        .map_err(|e| ScrapeError::fetch(url, e))?;

    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(ScrapeError::fetch(url, format!("status {}", status.as_u16())));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| ScrapeError::fetch(url, e))? {
        let remaining = MAX_BODY_BYTES - body.len();
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// Fetch `url` and run both extraction passes. Cancellation aborts the fetch
/// and the wait for the passes.
pub async fn scrape_static(
    http: &Client,
    url: &str,
    cancel: &CancellationToken,
) -> Result<ScrapedData, ScrapeError> {
    let body = tokio::select! {
        fetched = fetch_html(http, url) => fetched?,
        _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
    };

    extract_static(Arc::from(body), url, cancel).await
}

/// Run the readability and metadata passes concurrently over `html`.
///
/// Fails only when both passes fail, or when neither title nor body text was
/// found. On cancellation the passes are left to finish in the background and
/// their output is discarded.
pub async fn extract_static(
    html: Arc<[u8]>,
    url: &str,
    cancel: &CancellationToken,
) -> Result<ScrapedData, ScrapeError> {
    let result = Arc::new(Mutex::new(ScrapedData::for_url(url)));

    let readable = {
        let html = Arc::clone(&html);
        let result = Arc::clone(&result);
        let url = url.to_string();
        tokio::task::spawn_blocking(move || {
            let page = readable_pass(&html, &url)?;
            let mut data = lock(&result);
            data.content_text = page.text;
            data.author = page.byline;
            if !page.title.is_empty() {
                data.title = page.title;
            }
            if !page.site_name.is_empty() {
                data.site_name = page.site_name;
            }
            Ok::<(), String>(())
        })
    };

    let meta = {
        let html = Arc::clone(&html);
        let result = Arc::clone(&result);
        let url = url.to_string();
        tokio::task::spawn_blocking(move || {
            let page = meta_pass(&html, &url)?;
            let mut data = lock(&result);
            data.image_url = page.image_url;
            data.description = page.description;
            data.published_at = page.published_at;
            if data.title.is_empty() {
                data.title = page.title;
            }
            if data.site_name.is_empty() {
                data.site_name = page.site_name;
            }
            Ok::<(), String>(())
        })
    };

    let (readable, meta) = tokio::select! {
        joined = async { tokio::join!(readable, meta) } => joined,
        _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
    };

    if let (Err(readable), Err(meta)) = (flatten(readable), flatten(meta)) {
        return Err(ScrapeError::Parse { readable, meta });
    }

    let data = lock(&result).clone();
    if data.content_text.trim().is_empty() && data.title.trim().is_empty() {
        return Err(ScrapeError::NoContent(url.to_string()));
    }

    Ok(data)
}

fn flatten(joined: Result<Result<(), String>, JoinError>) -> Result<(), String> {
    joined.map_err(|e| format!("extraction task failed: {e}"))?
}

fn lock(record: &Mutex<ScrapedData>) -> MutexGuard<'_, ScrapedData> {
    match record.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Debug, Default)]
struct ReadablePage {
    title: String,
    text: String,
    byline: String,
    site_name: String,
}

#[derive(Debug, Default)]
struct MetaPage {
    title: String,
    description: String,
    image_url: String,
    site_name: String,
    published_at: String,
}

fn readable_pass(html: &[u8], url: &str) -> Result<ReadablePage, String> {
    let parsed_url = Url::parse(url).map_err(|e| format!("invalid url: {e}"))?;

    let mut reader = html;
    let product = extractor::extract(&mut reader, &parsed_url).map_err(|e| e.to_string())?;

    let doc = Html::parse_document(&String::from_utf8_lossy(html));

    Ok(ReadablePage {
        title: product.title.trim().to_string(),
        text: product.text.trim().to_string(),
        byline: find_byline(&doc).unwrap_or_default(),
        site_name: find_meta(&doc, &["og:site_name"]).unwrap_or_default(),
    })
}

fn meta_pass(html: &[u8], base_url: &str) -> Result<MetaPage, String> {
    let source = String::from_utf8_lossy(html);
    if source.trim().is_empty() {
        return Err("empty document".to_string());
    }

    let doc = Html::parse_document(&source);

    Ok(MetaPage {
        title: find_meta(&doc, TITLE_TAGS).unwrap_or_default(),
        description: find_meta(&doc, DESCRIPTION_TAGS).unwrap_or_default(),
        image_url: extract_image(&doc, base_url),
        site_name: find_meta(&doc, SITE_NAME_TAGS).unwrap_or_default(),
        published_at: find_meta(&doc, PUBLISHED_TAGS).unwrap_or_default(),
    })
}

fn find_byline(doc: &Html) -> Option<String> {
    if let Some(author) = find_meta(doc, &["author"]) {
        return Some(author);
    }

    BYLINE_SELECTORS.iter().find_map(|selector| {
        let sel = Selector::parse(selector).expect("valid selector");
        doc.select(&sel).find_map(|el| {
            let text = el
                .value()
                .attr("content")
                .map(str::to_string)
                .unwrap_or_else(|| el.text().collect::<Vec<_>>().join(" "));
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(text)
        })
    })
}
