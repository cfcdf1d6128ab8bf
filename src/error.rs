use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::db::StoreError;
use crate::services::browser::BrowserError;
use crate::services::queue::QueueError;
use crate::services::video::VideoError;

/// Errors surfaced by submission, status queries and the scrape pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("job not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("both parsers failed: readability={readable}, meta={meta}")]
    Parse { readable: String, meta: String },

    #[error("no meaningful content extracted from {0}")]
    NoContent(String),

    #[error("static scrape insufficient: {0}")]
    InsufficientContent(String),

    #[error("browser scrape failed: {0}")]
    Browser(#[from] BrowserError),

    #[error("video scrape failed: {0}")]
    Video(#[from] VideoError),

    #[error("job store error: {0}")]
    Store(#[from] StoreError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("operation cancelled")]
    Cancelled,
}

impl ScrapeError {
    pub fn fetch(url: &str, reason: impl ToString) -> Self {
        ScrapeError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScrapeError::Cancelled)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ScrapeError::Validation(_) => StatusCode::BAD_REQUEST,
            ScrapeError::NotFound(_) => StatusCode::NOT_FOUND,
            ScrapeError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal details stay in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ScrapeError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ScrapeError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ScrapeError::Unauthorized("missing token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ScrapeError::Cancelled.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_parse_error_reports_both_causes() {
        let err = ScrapeError::Parse {
            readable: "empty document".into(),
            meta: "task panicked".into(),
        };
        let text = err.to_string();
        assert!(text.contains("empty document"));
        assert!(text.contains("task panicked"));
    }
}
