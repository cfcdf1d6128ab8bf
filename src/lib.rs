//! Asynchronous URL scrape service
//!
//! Accepts URLs over HTTP, queues them as jobs and extracts structured
//! content (title, description, image, body text, author, publish date) in a
//! worker pool, using static HTML parsing with browser-rendered and
//! video-platform fallbacks.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
