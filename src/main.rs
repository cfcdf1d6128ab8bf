use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use scrape_jobs::app_state::AppState;
use scrape_jobs::config::AppConfig;
use scrape_jobs::db::RedisJobStore;
use scrape_jobs::routes;
use scrape_jobs::services::{jobs::JobService, queue::JobQueue, turnstile::TurnstileClient};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing scrape API server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!(
        "scrape_jobs_submitted_total",
        "Total scrape jobs accepted for processing"
    );
    metrics::describe_gauge!(
        "scrape_queue_depth",
        "Messages waiting in the scrape queue at the last health check"
    );

    tracing::info!("Connecting to Redis");
    let store =
        RedisJobStore::new(&config.redis_url, config.job_ttl()).expect("Failed to open job store");
    let queue = Arc::new(JobQueue::new(&config.redis_url).expect("Failed to initialize job queue"));

    if let Err(e) = queue.health_check().await {
        tracing::warn!(error = %e, "Redis not reachable at startup");
    }

    let turnstile =
        TurnstileClient::new(&config.turnstile_secret).expect("Failed to build Turnstile client");
    if !turnstile.is_enabled() {
        tracing::warn!("TURNSTILE_SECRET not set, bot verification disabled");
    }

    let jobs = JobService::new(Arc::new(store), queue.clone());
    let state = AppState::new(jobs, queue, turnstile);

    let app = routes::api_router(state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(64 * 1024));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!(bind_addr = %config.bind_addr, job_ttl_secs = config.job_ttl_secs, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
