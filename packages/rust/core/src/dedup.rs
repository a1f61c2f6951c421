//! Content identity keys and duplicate detection.
//!
//! A candidate is a duplicate when its identity key or its source URL is
//! already stored in the target collection, or when its key was accepted
//! earlier in the same run.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tadka_shared::Result;
use tadka_storage::Storage;

static BRACKETED_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\(\[]\s*(?:19|20)\d{2}\s*[\)\]]").unwrap());

static BOILERPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:movie\s+review|film\s+review|review|rating|ratings)\b").unwrap()
});

/// Lowercased title without review boilerplate, bracketed years, or
/// punctuation, with words joined by `-`.
///
/// `"Devara: Part 1 (2026) Movie Review"` → `"devara-part-1"`.
pub fn normalize_title(title: &str) -> String {
    let lower = title.to_lowercase();
    let no_years = BRACKETED_YEAR_RE.replace_all(&lower, " ");
    let no_boilerplate = BOILERPLATE_RE.replace_all(&no_years, " ");
    no_boilerplate
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Identity key: normalized title plus each non-empty discriminator
/// (language, platform).
pub fn identity_key(title: &str, discriminators: &[&str]) -> String {
    let mut key = normalize_title(title);
    for d in discriminators {
        let d = normalize_title(d);
        if !d.is_empty() {
            key.push(':');
            key.push_str(&d);
        }
    }
    key
}

/// Collection a candidate would be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection<'a> {
    Articles { category: &'a str },
    TheaterReleases,
    OttReleases,
    Videos,
    Galleries,
}

impl fmt::Display for Collection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Articles { category } => write!(f, "articles/{category}"),
            Collection::TheaterReleases => f.write_str("theater_releases"),
            Collection::OttReleases => f.write_str("ott_releases"),
            Collection::Videos => f.write_str("youtube_videos"),
            Collection::Galleries => f.write_str("galleries"),
        }
    }
}

/// Per-run duplicate filter backed by storage lookups.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen_keys: HashSet<String>,
    seen_sources: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the candidate is new. New candidates are remembered, so a
    /// second call with the same key or source in this run returns `false`.
    pub async fn accept(
        &mut self,
        storage: &Storage,
        collection: Collection<'_>,
        key: &str,
        source_url: Option<&str>,
    ) -> Result<bool> {
        let scoped_key = format!("{collection}|{key}");
        if self.seen_keys.contains(&scoped_key) {
            return Ok(false);
        }
        if let Some(src) = source_url {
            if self.seen_sources.contains(&format!("{collection}|{src}")) {
                return Ok(false);
            }
        }

        let stored = match collection {
            Collection::Articles { category } => {
                storage.article_exists(category, key, source_url).await?
            }
            Collection::TheaterReleases => storage.theater_release_exists(key).await?,
            Collection::OttReleases => storage.ott_release_exists(key).await?,
            Collection::Videos => storage.video_exists(key).await?,
            Collection::Galleries => match source_url {
                Some(src) => storage.gallery_exists_for_source(src).await?,
                None => false,
            },
        };
        if stored {
            tracing::debug!(%collection, key, "duplicate of stored record");
            return Ok(false);
        }

        self.seen_keys.insert(scoped_key);
        if let Some(src) = source_url {
            self.seen_sources.insert(format!("{collection}|{src}"));
        }
        Ok(true)
    }
}
