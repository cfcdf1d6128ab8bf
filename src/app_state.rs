use std::sync::Arc;

use crate::services::{jobs::JobService, queue::JobQueue, turnstile::TurnstileClient};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub jobs: JobService,
    pub queue: Arc<JobQueue>,
    pub turnstile: Arc<TurnstileClient>,
}

impl AppState {
    pub fn new(jobs: JobService, queue: Arc<JobQueue>, turnstile: TurnstileClient) -> Self {
        Self {
            jobs,
            queue,
            turnstile: Arc::new(turnstile),
        }
    }
}
