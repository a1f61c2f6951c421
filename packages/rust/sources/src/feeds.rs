//! YouTube channel feeds.

use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use tadka_shared::{Result, TadkaError};

/// Public Atom feed endpoint for a channel's uploads.
pub const YOUTUBE_FEED_BASE: &str = "https://www.youtube.com/feeds/videos.xml";

/// One entry from a channel feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedVideo {
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Feed URL for a channel on the public YouTube endpoint.
pub fn youtube_feed_url(channel_id: &str) -> Result<Url> {
    feed_url_for(YOUTUBE_FEED_BASE, channel_id)
}

/// Feed URL for a channel on an arbitrary feed endpoint.
pub fn feed_url_for(base: &str, channel_id: &str) -> Result<Url> {
    Url::parse_with_params(base, &[("channel_id", channel_id.trim())])
        .map_err(|e| TadkaError::config(format!("invalid feed base '{base}': {e}")))
}

/// Parse a channel feed. Entries without a recognizable video id are dropped.
pub fn parse_youtube_feed(bytes: &[u8]) -> Result<Vec<ScrapedVideo>> {
    let feed = feed_rs::parser::parse(bytes)
        .map_err(|e| TadkaError::parse(format!("invalid YouTube feed: {e}")))?;

    let videos: Vec<ScrapedVideo> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone());
            let video_id = video_id_from_url(&entry.id)
                .or_else(|| link.as_deref().and_then(video_id_from_url))?;
            let title = entry.title.map(|t| t.content.trim().to_string())?;
            let thumbnail_url = entry
                .media
                .iter()
                .flat_map(|m| m.thumbnails.iter())
                .map(|t| t.image.uri.clone())
                .next();

            Some(ScrapedVideo {
                url: link.unwrap_or_else(|| watch_url(&video_id)),
                video_id,
                title,
                thumbnail_url,
                published_at: entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.with_timezone(&Utc)),
            })
        })
        .collect();

    debug!(entries = videos.len(), "youtube feed parsed");
    Ok(videos)
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Extract an 11-character video id from a URL or feed entry id.
///
/// Handles `watch?v=`, `youtu.be/`, `/shorts/`, `/embed/` and `yt:video:`.
pub fn video_id_from_url(input: &str) -> Option<String> {
    let input = input.trim();
    if let Some(id) = input.strip_prefix("yt:video:") {
        return valid_video_id(id);
    }

    let url = Url::parse(input).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    match host {
        "youtu.be" => segments.next().and_then(valid_video_id),
        "youtube.com" | "youtube-nocookie.com" => {
            if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
                return valid_video_id(&v);
            }
            match segments.next()? {
                "shorts" | "embed" | "live" | "v" => segments.next().and_then(valid_video_id),
                _ => None,
            }
        }
        _ => None,
    }
}

fn valid_video_id(id: &str) -> Option<String> {
    let ok = id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    ok.then(|| id.to_string())
}

/// Whether a title matches any keyword (case-insensitive). No keywords matches all.
pub fn matches_keywords(title: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let title = title.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.trim().is_empty() && title.contains(&k.trim().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_ids_from_urls() {
        let expected = Some("dQw4w9WgXcQ".to_string());
        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "yt:video:dQw4w9WgXcQ",
        ] {
            assert_eq!(video_id_from_url(input), expected, "{input}");
        }
        assert_eq!(video_id_from_url("https://vimeo.com/12345678901"), None);
        assert_eq!(video_id_from_url("https://youtu.be/short"), None);
    }

    #[test]
    fn feed_url_has_channel_param() {
        let url = youtube_feed_url("UCabc123").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.youtube.com/feeds/videos.xml?channel_id=UCabc123"
        );
    }

    #[test]
    fn keyword_filter() {
        let keywords = vec!["trailer".to_string(), "Teaser".to_string()];
        assert!(matches_keywords("Devara Official TRAILER", &keywords));
        assert!(matches_keywords("Kanguva Teaser | Suriya", &keywords));
        assert!(!matches_keywords("Behind the scenes", &keywords));
        assert!(matches_keywords("Anything", &[]));
    }

    #[test]
    fn fixture_youtube_feed() {
        let xml = std::fs::read("../../../fixtures/feeds/youtube_channel.xml")
            .expect("missing fixture");
        let videos = parse_youtube_feed(&xml).expect("parse feed");

        assert_eq!(videos.len(), 3);
        assert_eq!(videos[0].video_id, "aaaaaaaaaa1");
        assert_eq!(videos[0].title, "Devara Part 1 Official Trailer");
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=aaaaaaaaaa1");
        assert_eq!(
            videos[0].thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/aaaaaaaaaa1/hqdefault.jpg")
        );
        assert!(videos[0].published_at.is_some());
    }

    #[test]
    fn rejects_garbage_feed() {
        assert!(parse_youtube_feed(b"<html>not a feed</html>").is_err());
    }
}
