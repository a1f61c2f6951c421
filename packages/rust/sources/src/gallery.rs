//! Photo gallery extraction (Instagram posts and gallery pages).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::text::{clean_text, meta_contents, page_title, resolve_url};

/// Images found on a gallery page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedGallery {
    pub title: String,
    /// Person or film the photos are of.
    pub entity_name: String,
    pub image_urls: Vec<Url>,
    pub source_url: Url,
}

const SKIPPED_EXTENSIONS: &[&str] = &[".svg", ".gif", ".ico"];
const TRACKING_MARKERS: &[&str] = &["pixel", "tracking", "/1x1", "spacer", "beacon"];

static TITLE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*\b(?:latest|new|hot|stunning|beautiful|recent)?\s*(?:photos?|pics|pictures|stills|images|gallery|photoshoot|clicks)\b.*$",
    )
    .unwrap()
});

static GALLERY_IMG_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "article img, main img, figure img, .gallery img, [class*=\"gallery\"] img, [class*=\"photo\"] img",
    )
    .unwrap()
});

/// Extract the gallery title, entity name, and image URLs from a page.
///
/// Images come from `og:image` tags plus `<img>` elements inside the main
/// content. Data URIs, SVG/GIF, tracking pixels and duplicates are skipped.
pub fn extract_gallery(doc: &Html, base: &Url) -> ScrapedGallery {
    let title = page_title(doc).unwrap_or_default();
    let mut seen = HashSet::new();
    let mut image_urls = Vec::new();

    let mut push = |src: &str, width: Option<&str>, height: Option<&str>| {
        if is_pixel(width) || is_pixel(height) {
            return;
        }
        let Some(url) = resolve_url(base, src) else {
            return;
        };
        if !is_photo_url(&url) {
            return;
        }
        if seen.insert(url.as_str().to_string()) {
            image_urls.push(url);
        }
    };

    for src in meta_contents(doc, "og:image") {
        push(&src, None, None);
    }

    for img in doc.select(&GALLERY_IMG_SEL) {
        let attrs = img.value();
        if let Some(src) = attrs.attr("data-src").or(attrs.attr("src")) {
            push(src, attrs.attr("width"), attrs.attr("height"));
        }
    }

    ScrapedGallery {
        entity_name: entity_name_from_title(&title),
        title,
        image_urls,
        source_url: base.clone(),
    }
}

fn is_pixel(dimension: Option<&str>) -> bool {
    dimension
        .and_then(|d| d.trim().trim_end_matches("px").parse::<u32>().ok())
        .is_some_and(|d| d <= 2)
}

fn is_photo_url(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    if SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }
    let full = url.as_str().to_lowercase();
    !TRACKING_MARKERS.iter().any(|m| full.contains(m))
}

/// Person or film name from a gallery/Instagram title.
///
/// `"Samantha (@samantharuthprabhuoffl) • Instagram photos and videos"` and
/// `"Samantha Latest Photos"` both give `"Samantha"`.
pub fn entity_name_from_title(title: &str) -> String {
    let mut name = title;
    for sep in [" on Instagram", " (@", " • ", " | ", " - ", ":"] {
        if let Some((head, _)) = name.split_once(sep) {
            name = head;
        }
    }
    let stripped = TITLE_SUFFIX_RE.replace(name, "");
    let cleaned = clean_text(stripped.trim_matches(|c: char| !c.is_alphanumeric()));
    if cleaned.is_empty() {
        clean_text(title)
    } else {
        cleaned
    }
}

// ---------------------------------------------------------------------------
// Instagram
// ---------------------------------------------------------------------------

/// Shortcode of an Instagram post, reel or IGTV URL.
pub fn instagram_shortcode(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if host != "instagram.com" && !host.ends_with(".instagram.com") {
        return None;
    }
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    match segments.next()? {
        "p" | "reel" | "reels" | "tv" => segments
            .next()
            .filter(|code| code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .map(String::from),
        _ => None,
    }
}

/// Instagram web origin.
pub const INSTAGRAM_BASE: &str = "https://www.instagram.com";

/// Canonical post URL, used as the gallery's source identity.
pub fn instagram_post_url(url: &Url) -> Option<Url> {
    instagram_page_url(INSTAGRAM_BASE, &instagram_shortcode(url)?)
}

/// Post page for `code` on an Instagram origin.
pub fn instagram_page_url(base: &str, code: &str) -> Option<Url> {
    Url::parse(&format!("{}/p/{code}/", base.trim_end_matches('/'))).ok()
}

/// Embed page for `code`, which carries the image without a login wall.
pub fn instagram_embed_url(base: &str, code: &str) -> Option<Url> {
    Url::parse(&format!("{}/p/{code}/embed/captioned/", base.trim_end_matches('/'))).ok()
}
