//! OpenGraph + article body review parser (fallback).

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use url::Url;

use super::{
    ReviewParser, ScrapedReview, article_body_html, labelled_lines, labelled_value,
    movie_title_from_headline, parse_rating,
};
use crate::text::{element_text, meta_content, page_title, resolve_url, split_list};

/// Generic parser for article pages whose headline mentions a review.
pub struct MetaReviewParser;

impl ReviewParser for MetaReviewParser {
    fn detect(&self, doc: &Html) -> bool {
        let is_article = meta_content(doc, &["og:type"]).is_some_and(|t| t == "article");
        is_article && page_title(doc).is_some_and(|t| t.to_lowercase().contains("review"))
    }

    fn extract_review(&self, doc: &Html, url: &Url) -> Option<ScrapedReview> {
        let title = page_title(doc)?;
        let lines = labelled_lines(doc);

        let movie_title = labelled_value(&lines, &["movie", "film", "movie name", "title"])
            .unwrap_or_else(|| movie_title_from_headline(&title));
        let body_html = article_body_html(doc);
        if movie_title.is_empty() || body_html.is_empty() {
            return None;
        }

        let rating = lines
            .iter()
            .filter(|(label, _)| label.contains("rating"))
            .find_map(|(_, value)| parse_rating(value))
            .or_else(|| star_rating(doc));

        Some(ScrapedReview {
            title,
            movie_title,
            rating,
            summary: meta_content(doc, &["og:description", "description", "twitter:description"]),
            body_html,
            image_url: meta_content(doc, &["og:image", "twitter:image"])
                .and_then(|src| resolve_url(url, &src))
                .map(|u| u.to_string()),
            cast: labelled_value(&lines, &["cast", "starring", "star cast", "actors"])
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            director: labelled_value(&lines, &["director", "directed by", "direction"]),
            genre: labelled_value(&lines, &["genre", "genres"]),
            platform: labelled_value(&lines, &["platform", "streaming on", "ott", "ott platform"]),
            verdict: labelled_value(&lines, &["verdict", "bottom line", "final verdict"]),
            language_hint: labelled_value(&lines, &["language"])
                .or_else(|| meta_content(doc, &["content-language", "language"])),
            published_at: meta_content(doc, &["article:published_time"])
                .and_then(|d| DateTime::parse_from_rfc3339(&d).ok())
                .map(|d| d.with_timezone(&Utc)),
            source_url: url.to_string(),
        })
    }

    fn name(&self) -> &str {
        "opengraph"
    }
}

static STAR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[class*="rating"], [class*="stars"]"#).unwrap());

/// Rating from the first element rendering star glyphs.
fn star_rating(doc: &Html) -> Option<f32> {
    doc.select(&STAR_SEL)
        .map(|el| element_text(&el))
        .find_map(|text| parse_rating(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_meta_review() {
        let html = std::fs::read_to_string("../../../fixtures/html/review_meta.html")
            .expect("missing fixture");
        let doc = Html::parse_document(&html);
        assert!(MetaReviewParser.detect(&doc));

        let url = Url::parse("https://reviews.example.com/tamil/amaran-movie-review").unwrap();
        let review = MetaReviewParser.extract_review(&doc, &url).expect("review");

        assert_eq!(review.movie_title, "Amaran");
        assert_eq!(review.rating, Some(3.5));
        assert_eq!(review.director.as_deref(), Some("Rajkumar Periasamy"));
        assert_eq!(review.cast, vec!["Sivakarthikeyan", "Sai Pallavi"]);
        assert_eq!(review.verdict.as_deref(), Some("A moving tribute"));
        assert_eq!(review.language_hint.as_deref(), Some("Tamil"));
        assert!(review.body_html.starts_with("<p>"));
        assert!(review.published_at.is_some());
        assert_eq!(
            review.image_url.as_deref(),
            Some("https://reviews.example.com/images/amaran.jpg")
        );
    }

    #[test]
    fn listing_pages_are_not_reviews() {
        let doc = Html::parse_document(
            r#"<html><head><meta property="og:type" content="website">
               <title>Latest Movie Reviews</title></head>
               <body><a href="/a-review">A</a></body></html>"#,
        );
        assert!(!MetaReviewParser.detect(&doc));
    }

    #[test]
    fn star_glyph_fallback() {
        let doc = Html::parse_document(
            r#"<html><head><meta property="og:type" content="article">
               <meta property="og:title" content="Pushpa 2 Review"></head>
               <body><article><div class="stars">★★★★☆</div>
               <p>Allu Arjun carries the film.</p></article></body></html>"#,
        );
        let url = Url::parse("https://reviews.example.com/pushpa-2-review").unwrap();
        let review = MetaReviewParser.extract_review(&doc, &url).unwrap();
        assert_eq!(review.movie_title, "Pushpa 2");
        assert_eq!(review.rating, Some(4.0));
    }
}
