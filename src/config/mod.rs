use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8080"). Unused by the worker.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Redis connection string for the job store and queue
    pub redis_url: String,

    /// Retention window for job records, restarted on every write
    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,

    /// Number of concurrent consumer slots in the worker
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Timeout for static page fetches
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Browserless base URL; browser fallback is disabled when unset
    pub browserless_url: Option<String>,

    #[serde(default)]
    pub browserless_token: String,

    /// YouTube Data API key; video extraction is disabled when unset
    pub youtube_api_key: Option<String>,

    // Screenshot storage is enabled only when bucket, endpoint and both keys are set.
    pub s3_bucket: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,

    #[serde(default = "default_s3_region")]
    pub s3_region: String,

    /// Public base URL for uploaded objects (e.g. a CDN in front of the bucket)
    pub s3_public_url: Option<String>,

    /// Cloudflare Turnstile secret; empty disables bot verification
    #[serde(default)]
    pub turnstile_secret: String,

    /// Listener for the worker's own Prometheus endpoint
    pub worker_metrics_addr: Option<String>,
}

/// Resolved object storage settings.
pub struct S3Settings<'a> {
    pub bucket: &'a str,
    pub endpoint: &'a str,
    pub region: &'a str,
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub public_url: Option<&'a str>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_job_ttl_secs() -> u64 {
    86_400
}

fn default_worker_count() -> usize {
    5
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_s3_region() -> String {
    "auto".to_string()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn browserless_url(&self) -> Option<&str> {
        non_empty(&self.browserless_url)
    }

    pub fn youtube_api_key(&self) -> Option<&str> {
        non_empty(&self.youtube_api_key)
    }

    pub fn s3(&self) -> Option<S3Settings<'_>> {
        Some(S3Settings {
            bucket: non_empty(&self.s3_bucket)?,
            endpoint: non_empty(&self.s3_endpoint)?,
            region: &self.s3_region,
            access_key: non_empty(&self.s3_access_key)?,
            secret_key: non_empty(&self.s3_secret_key)?,
            public_url: non_empty(&self.s3_public_url),
        })
    }
}
