//! Fetching and parsing of the external sources Tadka agents read.
//!
//! This crate provides:
//! - [`fetch`]: rate-limited HTTP fetcher with SSRF protection
//! - [`reviews`]: review parsers (JSON-LD, OpenGraph) and the [`ParserRegistry`]
//! - [`releases`]: header-driven release calendar tables
//! - [`feeds`]: YouTube channel feeds
//! - [`gallery`]: gallery and Instagram image extraction

pub mod feeds;
pub mod fetch;
pub mod gallery;
pub mod releases;
pub mod reviews;
pub mod text;

pub use feeds::{
    ScrapedVideo, YOUTUBE_FEED_BASE, feed_url_for, matches_keywords, parse_youtube_feed,
    video_id_from_url, watch_url, youtube_feed_url,
};
pub use fetch::{FetchedBytes, FetchedDocument, Fetcher, compute_hash, is_ssrf_target};
pub use gallery::{
    INSTAGRAM_BASE, ScrapedGallery, entity_name_from_title, extract_gallery,
    instagram_embed_url, instagram_page_url, instagram_post_url, instagram_shortcode,
};
pub use releases::{ScrapedRelease, parse_release_date, parse_release_tables};
pub use reviews::{
    JsonLdReviewParser, MetaReviewParser, ParserRegistry, ReviewParser, ScrapedReview,
    extract_review_links, movie_title_from_headline, parse_rating,
};
pub use text::slugify;
