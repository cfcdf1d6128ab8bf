//! Video-platform URL classification.

use regex::Regex;
use std::sync::OnceLock;

const VIDEO_HOSTS: [&str; 2] = ["youtube.com", "youtu.be"];

static VIDEO_ID_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn video_id_patterns() -> &'static [Regex] {
    VIDEO_ID_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(
                r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)([a-zA-Z0-9_-]{11})",
            )
            .expect("valid regex"),
            Regex::new(r"^([a-zA-Z0-9_-]{11})$").expect("valid regex"),
        ]
    })
}

/// True if the URL points at the video platform.
pub fn is_video_url(url: &str) -> bool {
    let lowered = url.to_lowercase();
    VIDEO_HOSTS.iter().any(|host| lowered.contains(host))
}

/// Extract the 11-character video id. Patterns are tried in order and the
/// first match wins.
pub fn extract_video_id(url: &str) -> Option<String> {
    video_id_patterns()
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
