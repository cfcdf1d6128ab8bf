//! Sufficiency check for static extraction results.

use crate::models::scrape::ScrapedData;
use crate::services::image::is_icon_or_logo;

pub const MIN_CONTENT_LEN: usize = 200;
pub const MIN_DESCRIPTION_LEN: usize = 40;

/// Verdict on a static extraction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Title plus enough body or description to be usable as-is.
    pub ok: bool,
    /// No usable image; a screenshot would improve the result.
    pub needs_screenshot: bool,
    pub reasons: Vec<&'static str>,
}

impl Evaluation {
    pub fn reason(&self) -> String {
        self.reasons.join(", ")
    }
}

pub fn evaluate(data: Option<&ScrapedData>) -> Evaluation {
    let Some(data) = data else {
        return Evaluation {
            ok: false,
            needs_screenshot: true,
            reasons: vec!["no data"],
        };
    };

    let title_ok = !data.title.trim().is_empty();
    // Thresholds are in UTF-8 bytes.
    let content_ok = data.content_text.trim().len() >= MIN_CONTENT_LEN;
    let desc_ok = data.description.trim().len() >= MIN_DESCRIPTION_LEN;
    let img_ok = !data.image_url.trim().is_empty() && !is_icon_or_logo(&data.image_url);

    let mut reasons = Vec::new();
    if !title_ok {
        reasons.push("missing title");
    }
    if !content_ok && !desc_ok {
        reasons.push("missing content/description");
    }
    if !img_ok {
        reasons.push("missing/weak image");
    }

    Evaluation {
        ok: title_ok && (content_ok || desc_ok),
        needs_screenshot: !img_ok,
        reasons,
    }
}
