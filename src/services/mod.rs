pub mod browser;
pub mod classifier;
pub mod evaluate;
pub mod image;
pub mod jobs;
pub mod queue;
pub mod scraper;
pub mod static_extract;
pub mod storage;
pub mod traits;
pub mod turnstile;
pub mod video;
pub mod worker;
