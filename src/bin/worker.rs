use metrics_exporter_prometheus::PrometheusBuilder;
use scrape_jobs::{
    config::AppConfig,
    db::RedisJobStore,
    services::{
        browser::BrowserlessClient, queue::JobQueue, scraper::Scraper, storage::S3Client,
        video::YouTubeClient, worker::ScrapeWorker,
    },
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting scrape worker");

    let config = AppConfig::from_env().expect("Failed to load configuration");

    if let Some(addr) = config.worker_metrics_addr.as_deref() {
        let addr: SocketAddr = addr.parse().expect("Invalid WORKER_METRICS_ADDR");
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .expect("Failed to install Prometheus exporter");
        tracing::info!(%addr, "Worker metrics listener started");
    }

    metrics::describe_histogram!(
        "scrape_processing_seconds",
        "Time to process a scrape job"
    );
    metrics::describe_counter!(
        "scrape_jobs_completed_total",
        "Total scrape jobs completed"
    );
    metrics::describe_counter!("scrape_jobs_failed_total", "Total scrape jobs that failed");
    metrics::describe_counter!(
        "scrape_outcomes_total",
        "Scrape outcomes by extraction strategy"
    );

    tracing::info!("Connecting to Redis");
    let store =
        RedisJobStore::new(&config.redis_url, config.job_ttl()).expect("Failed to open job store");
    store
        .health_check()
        .await
        .expect("Failed to connect to Redis");
    let queue = Arc::new(JobQueue::new(&config.redis_url).expect("Failed to initialize job queue"));

    match queue.recover_inflight().await {
        Ok(0) => {}
        Ok(n) => tracing::warn!(recovered = n, "Requeued unacknowledged messages"),
        Err(e) => tracing::error!(error = %e, "Failed to recover in-flight messages"),
    }

    let worker = Arc::new(ScrapeWorker::new(Arc::new(store), build_scraper(&config)));
    let cancel = CancellationToken::new();

    let mut slots = JoinSet::new();
    for slot in 0..config.worker_count.max(1) {
        let queue = queue.clone();
        let worker = worker.clone();
        let cancel = cancel.clone();
        slots.spawn(async move {
            let handler_cancel = cancel.clone();
            queue
                .consume(slot, cancel, |body| {
                    let worker = worker.clone();
                    let cancel = handler_cancel.clone();
                    async move { worker.handle(&body, &cancel).await }
                })
                .await;
        });
    }

    tracing::info!(slots = config.worker_count.max(1), "Worker ready");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown requested, draining consumer slots");
            cancel.cancel();
        }
        _ = slots.join_next() => {
            tracing::error!("Consumer slot exited unexpectedly, shutting down");
            cancel.cancel();
        }
    }

    while let Some(joined) = slots.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Consumer slot panicked");
        }
    }

    tracing::info!("Worker stopped");
}

fn build_scraper(config: &AppConfig) -> Scraper {
    let mut scraper = Scraper::new(config.http_timeout()).expect("Failed to build HTTP client");

    match config.browserless_url() {
        Some(url) => {
            let browser = BrowserlessClient::new(url, &config.browserless_token)
                .expect("Failed to initialize Browserless client");
            scraper = scraper.with_browser(Arc::new(browser));
            tracing::info!("Browser fallback enabled");
        }
        None => tracing::warn!("BROWSERLESS_URL not set, browser fallback disabled"),
    }

    match config.s3() {
        Some(s3) => {
            let storage = S3Client::new(
                s3.bucket,
                s3.endpoint,
                s3.region,
                s3.access_key,
                s3.secret_key,
                s3.public_url,
            )
            .expect("Failed to initialize S3 client");
            scraper = scraper.with_storage(Arc::new(storage));
            tracing::info!(bucket = s3.bucket, "Screenshot storage enabled");
        }
        None => tracing::warn!("S3 storage not configured, screenshots will be dropped"),
    }

    match config.youtube_api_key() {
        Some(key) => {
            let video = YouTubeClient::new(key).expect("Failed to initialize YouTube client");
            scraper = scraper.with_video(Arc::new(video));
            tracing::info!("Video extraction enabled");
        }
        None => tracing::warn!("YOUTUBE_API_KEY not set, video links use the generic path"),
    }

    scraper
}
