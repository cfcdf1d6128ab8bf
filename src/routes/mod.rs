use axum::routing::{get, post};
use axum::Router;

use crate::app_state::AppState;

pub mod health;
pub mod metrics;
pub mod scrape;

/// Application routes without the metrics endpoint or middleware layers.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/scrape", post(scrape::submit_scrape))
        .route("/api/v1/scrape/{id}", get(scrape::get_scrape_status))
        .with_state(state)
}
