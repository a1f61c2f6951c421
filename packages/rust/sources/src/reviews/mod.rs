//! Review page parsers.
//!
//! Parsers are generic strategies rather than per-site code: schema.org
//! JSON-LD first, then OpenGraph metadata plus the article body. The
//! [`ParserRegistry`] tries them in priority order.

mod jsonld;
mod meta;

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::text::{clean_text, element_text, escape_html, resolve_url};

pub use jsonld::JsonLdReviewParser;
pub use meta::MetaReviewParser;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Structured fields pulled from one review page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedReview {
    /// Headline as published.
    pub title: String,
    /// Film or series being reviewed.
    pub movie_title: String,
    /// Rating on a 0–5 scale.
    pub rating: Option<f32>,
    pub summary: Option<String>,
    /// Review body as simple paragraph HTML.
    pub body_html: String,
    pub image_url: Option<String>,
    pub cast: Vec<String>,
    pub director: Option<String>,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub verdict: Option<String>,
    /// Raw language signal from the page ("Telugu", "te").
    pub language_hint: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_url: String,
}

/// Strategy for extracting a review from a parsed page.
pub trait ReviewParser: Send + Sync {
    /// Whether this parser recognizes the document as a single review.
    fn detect(&self, doc: &Html) -> bool;

    /// Extract the review. `None` when required fields are missing.
    fn extract_review(&self, doc: &Html, url: &Url) -> Option<ScrapedReview>;

    /// Human-readable parser name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds review parsers in priority order.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn ReviewParser>>,
}

impl ParserRegistry {
    /// JSON-LD first, OpenGraph/body fallback last.
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(JsonLdReviewParser), Box::new(MetaReviewParser)],
        }
    }

    /// First parser that recognizes the document.
    pub fn detect(&self, doc: &Html) -> Option<&dyn ReviewParser> {
        self.parsers
            .iter()
            .find(|p| p.detect(doc))
            .map(|p| p.as_ref())
    }

    /// Extract with the first detecting parser that yields a review.
    pub fn extract(&self, doc: &Html, url: &Url) -> Option<ScrapedReview> {
        self.parsers
            .iter()
            .filter(|p| p.detect(doc))
            .find_map(|p| {
                let review = p.extract_review(doc, url);
                if review.is_some() {
                    tracing::debug!(parser = p.name(), %url, "review extracted");
                }
                review
            })
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Listing pages
// ---------------------------------------------------------------------------

static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Candidate review links on a listing page: same host, "review" in the
/// path or anchor text, in document order, without duplicates.
pub fn extract_review_links(doc: &Html, base: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for el in doc.select(&LINK_SEL) {
        let Some(url) = el.value().attr("href").and_then(|h| resolve_url(base, h)) else {
            continue;
        };
        if url.host_str() != base.host_str() || url.path() == base.path() {
            continue;
        }
        let path = url.path().to_lowercase();
        let text = element_text(&el).to_lowercase();
        if !path.contains("review") && !text.contains("review") {
            continue;
        }
        if seen.insert(url.as_str().to_string()) {
            links.push(url);
        }
    }

    links
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

static FRACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:/|out\s+of)\s*(\d+(?:\.\d+)?)").unwrap()
});

static LABELLED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)rating\s*[:\-]?\s*(\d+(?:\.\d+)?)").unwrap());

static BOILERPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:movie|film|web\s*series|series|ott)?\s*review\b").unwrap()
});

/// Parse a textual rating onto a 0–5 scale.
///
/// Understands `3/5`, `3.25 / 5`, `3 out of 5`, `7/10` (scaled),
/// `Rating: 3.5` and star glyphs (`★★★½`).
pub fn parse_rating(text: &str) -> Option<f32> {
    if let Some(caps) = FRACTION_RE.captures(text) {
        let value: f32 = caps[1].parse().ok()?;
        let scale: f32 = caps[2].parse().ok()?;
        if scale > 0.0 && value <= scale {
            return Some(round_rating(value / scale * 5.0));
        }
    }

    if let Some(caps) = LABELLED_RE.captures(text) {
        let value: f32 = caps[1].parse().ok()?;
        return match value {
            v if v <= 5.0 => Some(round_rating(v)),
            v if v <= 10.0 => Some(round_rating(v / 2.0)),
            _ => None,
        };
    }

    let full = text.chars().filter(|c| *c == '★').count();
    let half = text.contains('½');
    if full > 0 || half {
        let stars = full as f32 + if half { 0.5 } else { 0.0 };
        return Some(stars.min(5.0));
    }

    None
}

fn round_rating(value: f32) -> f32 {
    ((value * 100.0).round() / 100.0).clamp(0.0, 5.0)
}

/// Film name from a review headline.
///
/// `"Devara Part 1 Movie Review: NTR shines"` → `"Devara Part 1"`.
pub fn movie_title_from_headline(headline: &str) -> String {
    let head = headline
        .split([':', '|'])
        .next()
        .unwrap_or(headline)
        .split(" - ")
        .next()
        .unwrap_or(headline);
    let stripped = BOILERPLATE_RE.replace_all(head, " ");
    let cleaned = clean_text(&stripped);
    if cleaned.is_empty() {
        clean_text(headline)
    } else {
        cleaned
    }
}

/// Body containers, most specific first.
static BODY_SELS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        r#"[itemprop="reviewBody"]"#,
        r#"[itemprop="articleBody"]"#,
        "article",
        ".entry-content",
        "main",
        "body",
    ]
    .into_iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static PARAGRAPH_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());

static LABELLED_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, li, td, dd, span, div.meta").unwrap());

/// Paragraphs of the main article body as escaped `<p>` HTML.
pub(crate) fn article_body_html(doc: &Html) -> String {
    for sel in BODY_SELS.iter() {
        let Some(root) = doc.select(sel).next() else {
            continue;
        };
        let paragraphs: Vec<String> = root
            .select(&PARAGRAPH_SEL)
            .map(|p| element_text(&p))
            .filter(|t| !t.is_empty())
            .map(|t| format!("<p>{}</p>", escape_html(&t)))
            .collect();
        if !paragraphs.is_empty() {
            return paragraphs.join("\n");
        }
    }
    String::new()
}

/// `Label: value` lines from paragraphs, list items and table cells.
pub(crate) fn labelled_lines(doc: &Html) -> Vec<(String, String)> {
    doc.select(&LABELLED_SEL)
        .filter_map(|el| {
            let text = element_text(&el);
            let (label, value) = text.split_once(':')?;
            let label = label.trim().to_lowercase();
            let value = value.trim();
            (label.len() <= 24 && !value.is_empty()).then(|| (label, value.to_string()))
        })
        .collect()
}

/// Value of the first labelled line whose label is one of `labels`.
pub(crate) fn labelled_value(lines: &[(String, String)], labels: &[&str]) -> Option<String> {
    lines
        .iter()
        .find(|(label, _)| labels.contains(&label.as_str()))
        .map(|(_, value)| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_formats() {
        assert_eq!(parse_rating("3/5"), Some(3.0));
        assert_eq!(parse_rating("Rating: 3.25 / 5"), Some(3.25));
        assert_eq!(parse_rating("Rating: 3.5"), Some(3.5));
        assert_eq!(parse_rating("7/10"), Some(3.5));
        assert_eq!(parse_rating("3 out of 5 stars"), Some(3.0));
        assert_eq!(parse_rating("★★★½☆"), Some(3.5));
        assert_eq!(parse_rating("★★★★"), Some(4.0));
        assert_eq!(parse_rating("no score here"), None);
        // Not a rating: value above scale
        assert_eq!(parse_rating("12/5"), None);
    }

    #[test]
    fn headline_to_movie_title() {
        assert_eq!(
            movie_title_from_headline("Devara Part 1 Movie Review: NTR shines"),
            "Devara Part 1"
        );
        assert_eq!(movie_title_from_headline("Amaran Review | Tamil"), "Amaran");
        assert_eq!(
            movie_title_from_headline("Review - Lucky Baskhar"),
            "Review - Lucky Baskhar"
        );
    }

    #[test]
    fn review_links_same_host_only() {
        let doc = Html::parse_document(
            r##"<html><body>
                <a href="/reviews/">All reviews</a>
                <a href="/movie/devara-review">Devara</a>
                <a href="/movie/amaran">Amaran Review</a>
                <a href="/movie/devara-review#comments">Devara comments</a>
                <a href="https://other.example.com/x-review">Elsewhere</a>
                <a href="/news/box-office">Box office</a>
            </body></html>"##,
        );
        let base = Url::parse("https://reviews.example.com/reviews/").unwrap();
        let links: Vec<String> = extract_review_links(&doc, &base)
            .iter()
            .map(|u| u.path().to_string())
            .collect();
        assert_eq!(links, vec!["/movie/devara-review", "/movie/amaran"]);
    }

    #[test]
    fn registry_prefers_jsonld() {
        let html = r#"<html><head>
            <meta property="og:type" content="article">
            <meta property="og:title" content="Kalki Review">
            <script type="application/ld+json">
              {"@type": "Review", "name": "Kalki 2898 AD Review",
               "itemReviewed": {"@type": "Movie", "name": "Kalki 2898 AD"},
               "reviewRating": {"ratingValue": "4"}}
            </script></head><body><article><p>Body.</p></article></body></html>"#;
        let doc = Html::parse_document(html);
        let registry = ParserRegistry::new();
        assert_eq!(registry.detect(&doc).unwrap().name(), "json-ld");
        let url = Url::parse("https://reviews.example.com/kalki").unwrap();
        let review = registry.extract(&doc, &url).unwrap();
        assert_eq!(review.movie_title, "Kalki 2898 AD");
        assert_eq!(review.rating, Some(4.0));
    }
}
