use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub redis: ComponentHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_depth: Option<u64>,
}

/// GET /health: Redis reachability and queue backlog.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();

    let redis_check = match state.queue.health_check().await {
        Ok(()) => ComponentHealth {
            status: "ok".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            queue_depth: state.queue.queue_depth().await.ok(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Redis health check failed");
            ComponentHealth {
                status: "error".to_string(),
                latency_ms: None,
                queue_depth: None,
            }
        }
    };

    let healthy = redis_check.status == "ok";
    if let Some(depth) = redis_check.queue_depth {
        metrics::gauge!("scrape_queue_depth").set(depth as f64);
    }

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks { redis: redis_check },
    };

    (status_code, Json(response))
}
