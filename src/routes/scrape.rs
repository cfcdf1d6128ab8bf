use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::app_state::AppState;
use crate::error::ScrapeError;
use crate::models::submission::{ScrapeStatusResponse, SubmitScrapeRequest, SubmitScrapeResponse};

const TURNSTILE_HEADER: &str = "x-turnstile-token";

/// POST /api/v1/scrape: queue a URL for scraping.
pub async fn submit_scrape(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SubmitScrapeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitScrapeResponse>), ScrapeError> {
    if state.turnstile.is_enabled() {
        let token = header_str(&headers, TURNSTILE_HEADER)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ScrapeError::Unauthorized("missing turnstile token".to_string()))?;

        state
            .turnstile
            .verify(token, &client_ip(&headers))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Turnstile verification failed");
                ScrapeError::Unauthorized("invalid turnstile token".to_string())
            })?;
    }

    let Json(request) = body.map_err(|e| ScrapeError::Validation(e.body_text()))?;
    let job_id = state.jobs.submit(request).await?;

    Ok((StatusCode::ACCEPTED, Json(SubmitScrapeResponse { job_id })))
}

/// GET /api/v1/scrape/{id}: current job state, with the result once completed.
pub async fn get_scrape_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScrapeStatusResponse>, ScrapeError> {
    Ok(Json(state.jobs.status(&id).await?))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

/// Best-effort client address from proxy headers.
fn client_ip(headers: &HeaderMap) -> String {
    header_str(headers, "cf-connecting-ip")
        .or_else(|| {
            header_str(headers, "x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
        })
        .unwrap_or_default()
        .to_string()
}
