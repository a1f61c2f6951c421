//! schema.org JSON-LD review parser.
//!
//! Looks for a `Review` / `CriticReview` object in any
//! `<script type="application/ld+json">` block, including `@graph` arrays.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use super::{ReviewParser, ScrapedReview, article_body_html, movie_title_from_headline};
use crate::text::{clean_text, escape_html, page_title, resolve_url};

const REVIEW_TYPES: &[&str] = &["Review", "CriticReview"];

/// Parser for pages that embed schema.org review markup.
pub struct JsonLdReviewParser;

impl ReviewParser for JsonLdReviewParser {
    fn detect(&self, doc: &Html) -> bool {
        find_review(doc).is_some()
    }

    fn extract_review(&self, doc: &Html, url: &Url) -> Option<ScrapedReview> {
        let review = find_review(doc)?;
        let item = review.get("itemReviewed").unwrap_or(&Value::Null);

        let title = string_field(&review, &["name", "headline"])
            .or_else(|| page_title(doc))
            .unwrap_or_default();
        let movie_title = string_field(item, &["name"])
            .unwrap_or_else(|| movie_title_from_headline(&title));
        if movie_title.is_empty() {
            return None;
        }

        let body_html = match string_field(&review, &["reviewBody"]) {
            Some(body) => body
                .split("\n\n")
                .map(clean_text)
                .filter(|p| !p.is_empty())
                .map(|p| format!("<p>{}</p>", escape_html(&p)))
                .collect::<Vec<_>>()
                .join("\n"),
            None => article_body_html(doc),
        };

        let image_url = image_field(&review)
            .or_else(|| image_field(item))
            .and_then(|src| resolve_url(url, &src))
            .map(|u| u.to_string());

        Some(ScrapedReview {
            title: if title.is_empty() { movie_title.clone() } else { title },
            movie_title,
            rating: review.get("reviewRating").and_then(rating_field),
            summary: string_field(&review, &["description"]),
            body_html,
            image_url,
            cast: names(item.get("actor")),
            director: names(item.get("director")).into_iter().next(),
            genre: names(item.get("genre")).into_iter().next(),
            platform: None,
            verdict: None,
            language_hint: string_field(item, &["inLanguage"])
                .or_else(|| string_field(&review, &["inLanguage"])),
            published_at: string_field(&review, &["datePublished"])
                .and_then(|d| DateTime::parse_from_rfc3339(&d).ok())
                .map(|d| d.with_timezone(&Utc)),
            source_url: url.to_string(),
        })
    }

    fn name(&self) -> &str {
        "json-ld"
    }
}

static LD_JSON_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

/// First review object found in the document's JSON-LD blocks.
fn find_review(doc: &Html) -> Option<Value> {
    doc.select(&LD_JSON_SEL)
        .filter_map(|el| serde_json::from_str::<Value>(&el.text().collect::<String>()).ok())
        .find_map(|value| find_review_in(&value).cloned())
}

fn find_review_in(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_review_in),
        Value::Object(map) => {
            if is_review_type(map.get("@type")) {
                return Some(value);
            }
            map.get("@graph").and_then(find_review_in)
        }
        _ => None,
    }
}

fn is_review_type(ty: Option<&Value>) -> bool {
    match ty {
        Some(Value::String(s)) => REVIEW_TYPES.contains(&s.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .any(|t| t.as_str().is_some_and(|s| REVIEW_TYPES.contains(&s))),
        _ => false,
    }
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .filter_map(|v| v.as_str())
        .map(clean_text)
        .find(|s| !s.is_empty())
}

/// Names from a string, `{name}` object, or an array of either.
fn names(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![clean_text(s)],
        Some(Value::Object(_)) => value
            .and_then(|v| string_field(v, &["name"]))
            .into_iter()
            .collect(),
        Some(Value::Array(items)) => items.iter().flat_map(|v| names(Some(v))).collect(),
        _ => Vec::new(),
    }
}

fn image_field(value: &Value) -> Option<String> {
    match value.get("image")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("url").and_then(|u| u.as_str()).map(String::from),
        Value::Array(items) => items.first().and_then(|first| match first {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj.get("url").and_then(|u| u.as_str()).map(String::from),
            _ => None,
        }),
        _ => None,
    }
}

/// `reviewRating` scaled to /5 using `bestRating` (default 5).
fn rating_field(rating: &Value) -> Option<f32> {
    let number = |v: &Value| -> Option<f32> {
        match v {
            Value::Number(n) => n.as_f64().map(|f| f as f32),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    };
    let value = rating.get("ratingValue").and_then(number)?;
    let best = rating.get("bestRating").and_then(number).unwrap_or(5.0);
    if best <= 0.0 || value > best {
        return None;
    }
    Some(((value / best * 5.0) * 100.0).round() / 100.0)
}
