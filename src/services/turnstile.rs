use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Cloudflare Turnstile token verification. An empty secret disables it.
pub struct TurnstileClient {
    http: Client,
    secret: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl TurnstileClient {
    pub fn new(secret: &str) -> Result<Self, TurnstileError> {
        let http = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            http,
            secret: secret.trim().to_string(),
            endpoint: SITEVERIFY_URL.to_string(),
        })
    }

    /// Point verification at another siteverify-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        !self.secret.is_empty()
    }

    pub async fn verify(&self, token: &str, remote_ip: &str) -> Result<(), TurnstileError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let response: SiteverifyResponse = self
            .http
            .post(&self.endpoint)
            .form(&[
                ("secret", self.secret.as_str()),
                ("response", token),
                ("remoteip", remote_ip),
            ])
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            return Err(TurnstileError::Rejected(response.error_codes.join(", ")));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TurnstileError {
    #[error("turnstile request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("turnstile validation failed: [{0}]")]
    Rejected(String),
}
