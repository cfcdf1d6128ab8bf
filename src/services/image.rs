//! Representative-image discovery and related URL helpers.
//!
//! The locator walks a fixed priority chain: social meta tags, the legacy
//! `image_src` link, images inside common content containers, then any
//! reasonably sized image on the page.

use scraper::{ElementRef, Html, Selector};
use url::Url;

const IMAGE_META_TAGS: &[&str] = &[
    "og:image",
    "og:image:url",
    "og:image:secure_url",
    "twitter:image",
    "twitter:image:src",
];

const CONTENT_IMAGE_SELECTORS: &[&str] = &[
    "article img",
    "main img",
    ".post-content img",
    ".entry-content img",
    ".content img",
    "#content img",
];

const LAZY_SRC_ATTRS: &[&str] = &[
    "data-src",
    "data-lazy-src",
    "data-original",
    "data-lazy",
    "data-srcset",
    "srcset",
];

const ICON_PATTERNS: &[&str] = &[
    "favicon", "icon", "logo", "sprite", "avatar", "badge", "spacer", "pixel", "tracking",
    "analytics", "1x1", "blank",
];

/// Dimensions that mark an image as a tracker or icon.
const TINY_DIMENSIONS: &[&str] = &["1", "16", "32"];

/// Find the best image for the document, resolved against `base_url`.
/// Returns an empty string when nothing qualifies.
pub fn extract_image(doc: &Html, base_url: &str) -> String {
    if let Some(src) = find_meta(doc, IMAGE_META_TAGS) {
        return resolve_url(base_url, &src);
    }

    let link_sel = Selector::parse(r#"link[rel="image_src"]"#).expect("valid selector");
    if let Some(href) = doc
        .select(&link_sel)
        .next()
        .and_then(|link| link.value().attr("href"))
        .filter(|href| !href.is_empty())
    {
        return resolve_url(base_url, href);
    }

    for selector in CONTENT_IMAGE_SELECTORS {
        let sel = Selector::parse(selector).expect("valid selector");
        let found = doc
            .select(&sel)
            .filter_map(image_src)
            .find(|src| !is_icon_or_logo(src));
        if let Some(src) = found {
            return resolve_url(base_url, &src);
        }
    }

    let img_sel = Selector::parse("img").expect("valid selector");
    doc.select(&img_sel)
        .filter(|img| !has_tiny_dimension(img))
        .filter_map(image_src)
        .find(|src| !is_icon_or_logo(src))
        .map(|src| resolve_url(base_url, &src))
        .unwrap_or_default()
}

fn has_tiny_dimension(img: &ElementRef) -> bool {
    ["width", "height"].iter().any(|attr| {
        img.value()
            .attr(attr)
            .map(|v| TINY_DIMENSIONS.contains(&v.trim()))
            .unwrap_or(false)
    })
}

/// Source URL of an `<img>`, handling lazy-loading attributes.
pub fn image_src(img: ElementRef) -> Option<String> {
    let element = img.value();

    if let Some(src) = element.attr("src") {
        if !src.is_empty() && !src.starts_with("data:") {
            return Some(src.to_string());
        }
    }

    for attr in LAZY_SRC_ATTRS {
        let Some(val) = element.attr(attr).filter(|v| !v.is_empty()) else {
            continue;
        };

        if attr.ends_with("srcset") {
            let first = val
                .split(',')
                .next()
                .and_then(|entry| entry.split_whitespace().next())
                .unwrap_or("");
            if !first.is_empty() {
                return Some(first.to_string());
            }
        } else {
            return Some(val.to_string());
        }
    }

    None
}

/// Heuristic: does this image URL look like an icon, logo or tracker?
pub fn is_icon_or_logo(src: &str) -> bool {
    let lowered = src.to_lowercase();
    ICON_PATTERNS.iter().any(|pattern| lowered.contains(pattern))
}

/// Resolve a possibly relative URL against `base_url`.
///
/// Unparsable inputs come back unchanged.
pub fn resolve_url(base_url: &str, relative: &str) -> String {
    if relative.is_empty() {
        return String::new();
    }
    if relative.starts_with("http://") || relative.starts_with("https://") {
        return relative.to_string();
    }
    if relative.starts_with("//") {
        return format!("https:{relative}");
    }

    Url::parse(base_url)
        .and_then(|base| base.join(relative))
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| relative.to_string())
}

/// First non-blank `content` among `meta[property=tag]` / `meta[name=tag]`,
/// trying each tag in order. A `title` entry falls back to the `<title>` text.
pub fn find_meta(doc: &Html, tags: &[&str]) -> Option<String> {
    for tag in tags {
        for attr in ["property", "name"] {
            let Ok(sel) = Selector::parse(&format!(r#"meta[{attr}="{tag}"]"#)) else {
                continue;
            };
            let content = doc
                .select(&sel)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .map(str::trim)
                .filter(|c| !c.is_empty());
            if let Some(content) = content {
                return Some(content.to_string());
            }
        }
    }

    if tags.contains(&"title") {
        let title_sel = Selector::parse("title").expect("valid selector");
        return doc
            .select(&title_sel)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty());
    }

    None
}
