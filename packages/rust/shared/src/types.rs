//! Core domain types for Tadka CMS records and agent configuration.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TadkaError;
use crate::regions::Language;

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for record identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Generate a new time-sortable identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Publication state of a CMS record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Published,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = TadkaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            other => Err(TadkaError::validation(format!(
                "unknown content status '{other}'"
            ))),
        }
    }
}

/// The kind of content-generation job an agent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    /// Theatrical movie reviews → articles.
    MovieReview,
    /// Streaming (OTT) reviews → articles.
    OttReview,
    /// Theater release calendar → theater releases.
    TheaterRelease,
    /// OTT release calendar → OTT releases.
    OttRelease,
    /// YouTube channel RSS → videos.
    Video,
    /// Instagram/photo pages → image galleries.
    TadkaPics,
}

impl AgentKind {
    pub const ALL: [AgentKind; 6] = [
        AgentKind::MovieReview,
        AgentKind::OttReview,
        AgentKind::TheaterRelease,
        AgentKind::OttRelease,
        AgentKind::Video,
        AgentKind::TadkaPics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::MovieReview => "movie-review",
            AgentKind::OttReview => "ott-review",
            AgentKind::TheaterRelease => "theater-release",
            AgentKind::OttRelease => "ott-release",
            AgentKind::Video => "video",
            AgentKind::TadkaPics => "tadka-pics",
        }
    }

    /// Whether this agent needs a `source_url` to do anything.
    pub fn requires_source_url(&self) -> bool {
        !matches!(self, AgentKind::Video)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = TadkaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace('_', "-");
        AgentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == needle)
            .ok_or_else(|| TadkaError::validation(format!("unknown agent kind '{s}'")))
    }
}

/// Whether an OTT release is a film or an episodic series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Series,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Series => "series",
        }
    }

    /// Classify free text from a listing ("Web Series", "Film", "S2"...).
    pub fn from_hint(hint: &str) -> Self {
        let hint = hint.to_lowercase();
        if hint.contains("series") || hint.contains("season") || hint.contains("show") {
            ContentType::Series
        } else {
            ContentType::Movie
        }
    }
}

impl FromStr for ContentType {
    type Err = TadkaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" => Ok(ContentType::Movie),
            "series" => Ok(ContentType::Series),
            other => Err(TadkaError::validation(format!(
                "unknown content type '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Agent configuration
// ---------------------------------------------------------------------------

/// A configured scraping/content-generation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique agent identifier (UUID v7).
    pub id: String,
    /// Unique human-readable name.
    pub name: String,
    /// What the agent produces.
    pub kind: AgentKind,
    /// Listing/review/gallery page the agent starts from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Forces the language of everything this agent writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// Forces the state tags of everything this agent writes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<String>,
    /// Title keywords to keep (video agent); empty keeps all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Maximum items to create per run.
    pub max_items: u32,
    /// Minutes between scheduled runs; 0 means manual runs only.
    pub schedule_minutes: u32,
    /// Whether the scheduler may run this agent.
    pub enabled: bool,
    /// Publish created records immediately instead of saving drafts.
    pub auto_publish: bool,
    /// When the agent last finished a run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    /// When the agent was created.
    pub created_at: DateTime<Utc>,
}

impl AgentConfig {
    /// Create an enabled agent with default limits.
    pub fn new(name: impl Into<String>, kind: AgentKind) -> Self {
        Self {
            id: RecordId::new().to_string(),
            name: name.into(),
            kind,
            source_url: None,
            language: None,
            states: Vec::new(),
            keywords: Vec::new(),
            max_items: 10,
            schedule_minutes: 0,
            enabled: true,
            auto_publish: false,
            last_run_at: None,
            created_at: Utc::now(),
        }
    }

    /// Status for records this agent creates.
    pub fn initial_status(&self) -> ContentStatus {
        if self.auto_publish {
            ContentStatus::Published
        } else {
            ContentStatus::Draft
        }
    }
}

/// History row for a single agent execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRun {
    pub id: String,
    pub agent_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Run statistics as JSON (created, duplicates, errors...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// Structured review fields attached to review articles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewDetails {
    /// Film or series name as reviewed.
    pub movie_title: String,
    /// Rating normalized to a 0–5 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cast: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Streaming platform for OTT reviews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// One-line verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
}

/// A CMS article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    /// URL slug, unique across articles.
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Article body (HTML).
    pub content: String,
    /// Section, e.g. `movie-reviews`.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// State codes for regional filtering.
    pub states: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Normalized identity used for deduplication.
    pub dedup_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewDetails>,
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Galleries
// ---------------------------------------------------------------------------

/// One numbered image inside a gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    /// Sequence number within the entity (`<entity-slug>-<number>.<ext>`).
    pub number: u32,
    /// File name in the media store.
    pub file_name: String,
    /// Where the image was downloaded from.
    pub source_url: String,
}

/// An image gallery (Tadka Pics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gallery {
    pub id: String,
    pub title: String,
    pub slug: String,
    /// Person or film the gallery is about.
    pub entity_name: String,
    /// Slug of `entity_name`; images are numbered per entity.
    pub entity_slug: String,
    pub images: Vec<GalleryImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub states: Vec<String>,
    pub source_url: String,
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Releases
// ---------------------------------------------------------------------------

/// A theatrical release calendar entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TheaterRelease {
    pub id: String,
    pub movie_name: String,
    pub release_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub states: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cast: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub dedup_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A streaming-platform release calendar entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OttRelease {
    pub id: String,
    pub movie_name: String,
    /// Streaming platform name (Netflix, Prime Video, Aha...).
    pub platform: String,
    pub content_type: ContentType,
    pub release_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub states: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub dedup_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// YouTube
// ---------------------------------------------------------------------------

/// A YouTube channel the video agent follows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeChannel {
    pub id: String,
    pub name: String,
    /// YouTube channel id (`UC...`).
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// CMS section for the channel's videos (`trailers`, `songs`...).
    pub category: String,
    pub active: bool,
}

/// A video picked up from a channel feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeVideo {
    pub id: String,
    /// YouTube video id (11 chars).
    pub video_id: String,
    /// YouTube channel id the video came from.
    pub channel_id: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub states: Vec<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
