//! Builds CMS records from parsed content and writes them to storage.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use tadka_shared::{
    AgentConfig, Article, ContentStatus, ContentType, Gallery, GalleryImage, OttRelease,
    RecordId, Result, ReviewDetails, TheaterRelease, YouTubeChannel, YouTubeVideo,
};
use tadka_sources::{ScrapedGallery, ScrapedRelease, ScrapedReview, ScrapedVideo, slugify};
use tadka_storage::Storage;

use crate::normalize::Normalized;

/// Article category for theatrical reviews.
pub const MOVIE_REVIEWS: &str = "movie-reviews";
/// Article category for streaming reviews.
pub const OTT_REVIEWS: &str = "ott-reviews";

const MAX_SLUG_ATTEMPTS: u32 = 1000;

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

fn published_at(status: ContentStatus, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (status == ContentStatus::Published).then_some(now)
}

/// Base slug for a review article (`"devara-part-1-review"`).
pub fn review_slug(review: &ScrapedReview) -> String {
    let name = if review.movie_title.is_empty() {
        &review.title
    } else {
        &review.movie_title
    };
    slugify(&format!("{name} review"))
}

/// Review article for `category`. `slug` must already be unique.
pub fn build_article(
    agent: &AgentConfig,
    review: &ScrapedReview,
    category: &str,
    dedup_key: String,
    slug: String,
    tags: &Normalized,
) -> Article {
    let now = Utc::now();
    let status = agent.initial_status();
    Article {
        id: RecordId::new().to_string(),
        title: review.title.clone(),
        slug,
        summary: review.summary.clone(),
        content: review.body_html.clone(),
        category: category.to_string(),
        language: tags.language,
        states: tags.states.clone(),
        image_url: review.image_url.clone(),
        source_url: Some(review.source_url.clone()),
        dedup_key,
        review: Some(ReviewDetails {
            movie_title: review.movie_title.clone(),
            rating: review.rating,
            cast: review.cast.clone(),
            director: review.director.clone(),
            genre: review.genre.clone(),
            platform: review.platform.clone(),
            verdict: review.verdict.clone(),
        }),
        status,
        agent_id: Some(agent.id.clone()),
        created_at: now,
        published_at: published_at(status, now),
    }
}

pub fn build_theater_release(
    agent: &AgentConfig,
    release: &ScrapedRelease,
    dedup_key: String,
    tags: &Normalized,
) -> TheaterRelease {
    TheaterRelease {
        id: RecordId::new().to_string(),
        movie_name: release.movie_name.clone(),
        release_date: release.release_date,
        language: tags.language,
        states: tags.states.clone(),
        genres: release.genres.clone(),
        cast: release.cast.clone(),
        director: release.director.clone(),
        poster_url: release.poster_url.clone(),
        source_url: Some(release.source_url.clone()),
        dedup_key,
        agent_id: Some(agent.id.clone()),
        created_at: Utc::now(),
    }
}

/// OTT release on `platform`. The content type comes from the row's type
/// column, else from the platform cell ("Netflix (Series)").
pub fn build_ott_release(
    agent: &AgentConfig,
    release: &ScrapedRelease,
    platform: &str,
    dedup_key: String,
    tags: &Normalized,
) -> OttRelease {
    let type_hint = release.content_type_hint.as_deref().unwrap_or(platform);
    OttRelease {
        id: RecordId::new().to_string(),
        movie_name: release.movie_name.clone(),
        platform: platform.to_string(),
        content_type: ContentType::from_hint(type_hint),
        release_date: release.release_date,
        language: tags.language,
        states: tags.states.clone(),
        poster_url: release.poster_url.clone(),
        source_url: Some(release.source_url.clone()),
        dedup_key,
        agent_id: Some(agent.id.clone()),
        created_at: Utc::now(),
    }
}

/// Video from a feed entry. The channel supplies the category.
pub fn build_video(
    agent: &AgentConfig,
    video: &ScrapedVideo,
    channel: &YouTubeChannel,
    tags: &Normalized,
) -> YouTubeVideo {
    YouTubeVideo {
        id: RecordId::new().to_string(),
        video_id: video.video_id.clone(),
        channel_id: channel.channel_id.clone(),
        title: video.title.clone(),
        url: video.url.clone(),
        thumbnail_url: video.thumbnail_url.clone(),
        language: tags.language,
        states: tags.states.clone(),
        category: channel.category.clone(),
        published_at: video.published_at,
        status: agent.initial_status(),
        agent_id: Some(agent.id.clone()),
        created_at: Utc::now(),
    }
}

/// Gallery for already-stored images. `source_url` is the canonical source
/// identity (for Instagram, the post URL without query).
pub fn build_gallery(
    agent: &AgentConfig,
    scraped: &ScrapedGallery,
    source_url: &str,
    images: Vec<GalleryImage>,
    tags: &Normalized,
) -> Gallery {
    let title = if scraped.title.is_empty() {
        format!("{} Photos", scraped.entity_name)
    } else {
        scraped.title.clone()
    };
    let entity_slug = slugify(&scraped.entity_name);
    Gallery {
        id: RecordId::new().to_string(),
        slug: slugify(&title),
        title,
        entity_name: scraped.entity_name.clone(),
        entity_slug,
        images,
        language: tags.language,
        states: tags.states.clone(),
        source_url: source_url.to_string(),
        status: agent.initial_status(),
        agent_id: Some(agent.id.clone()),
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

/// First free article slug: `base`, then `base-2`, `base-3`, ...
pub async fn unique_slug(storage: &Storage, base: &str) -> Result<String> {
    let base = if base.is_empty() { "article" } else { base };
    if !storage.slug_exists(base).await? {
        return Ok(base.to_string());
    }
    for n in 2..MAX_SLUG_ATTEMPTS {
        let candidate = format!("{base}-{n}");
        if !storage.slug_exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    Ok(format!("{base}-{}", RecordId::new()))
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Writes records on behalf of one agent.
pub struct Writer<'a> {
    storage: &'a Storage,
    agent: &'a AgentConfig,
}

impl<'a> Writer<'a> {
    pub fn new(storage: &'a Storage, agent: &'a AgentConfig) -> Self {
        Self { storage, agent }
    }

    pub async fn write_review(
        &self,
        review: &ScrapedReview,
        category: &str,
        dedup_key: String,
        tags: &Normalized,
    ) -> Result<Article> {
        let slug = unique_slug(self.storage, &review_slug(review)).await?;
        let article = build_article(self.agent, review, category, dedup_key, slug, tags);
        self.storage.insert_article(&article).await?;
        info!(
            id = %article.id,
            slug = %article.slug,
            status = %article.status,
            "review article written"
        );
        Ok(article)
    }

    pub async fn write_theater_release(
        &self,
        release: &ScrapedRelease,
        dedup_key: String,
        tags: &Normalized,
    ) -> Result<TheaterRelease> {
        let record = build_theater_release(self.agent, release, dedup_key, tags);
        self.storage.insert_theater_release(&record).await?;
        debug!(movie = %record.movie_name, date = %record.release_date, "theater release written");
        Ok(record)
    }

    pub async fn write_ott_release(
        &self,
        release: &ScrapedRelease,
        platform: &str,
        dedup_key: String,
        tags: &Normalized,
    ) -> Result<OttRelease> {
        let record = build_ott_release(self.agent, release, platform, dedup_key, tags);
        self.storage.insert_ott_release(&record).await?;
        debug!(
            movie = %record.movie_name,
            platform = %record.platform,
            date = %record.release_date,
            "ott release written"
        );
        Ok(record)
    }

    /// Insert a video. `false` when the video id was already stored.
    pub async fn write_video(
        &self,
        video: &ScrapedVideo,
        channel: &YouTubeChannel,
        tags: &Normalized,
    ) -> Result<bool> {
        let record = build_video(self.agent, video, channel, tags);
        let inserted = self.storage.insert_video(&record).await?;
        if inserted {
            debug!(video_id = %record.video_id, channel = %channel.name, "video written");
        }
        Ok(inserted)
    }

    pub async fn write_gallery(&self, gallery: &Gallery) -> Result<()> {
        self.storage.insert_gallery(gallery).await?;
        info!(
            id = %gallery.id,
            entity = %gallery.entity_slug,
            images = gallery.images.len(),
            "gallery written"
        );
        Ok(())
    }
}
