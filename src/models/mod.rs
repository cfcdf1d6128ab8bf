pub mod job;
pub mod scrape;
pub mod submission;
