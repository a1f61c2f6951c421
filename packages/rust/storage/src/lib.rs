//! libSQL storage layer for the Tadka CMS collections.
//!
//! The [`Storage`] struct wraps a libSQL database holding agents and their run
//! history, articles, galleries, theater/OTT releases, and YouTube channels and
//! videos. Every collection has the lookups the agents need to deduplicate
//! before writing.
//!
//! **Access rules:**
//! - agents and CLI admin commands: read-write via [`Storage::open`]
//! - reporting tools: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database, params};
use tadka_shared::{
    AgentConfig, AgentRun, Article, ContentStatus, ContentType, Gallery, GalleryImage, Language,
    OttRelease, Result, TadkaError, TheaterRelease, YouTubeChannel, YouTubeVideo,
};
use uuid::Uuid;

/// Date format used for release dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

const AGENT_COLUMNS: &str = "id, name, kind, source_url, language, states_json, keywords_json, \
     max_items, schedule_minutes, enabled, auto_publish, last_run_at, created_at";

const ARTICLE_COLUMNS: &str = "id, title, slug, summary, content, category, language, states_json, \
     image_url, source_url, dedup_key, review_json, status, agent_id, created_at, published_at";

const GALLERY_COLUMNS: &str = "id, title, slug, entity_name, entity_slug, language, states_json, \
     source_url, status, agent_id, created_at";

const THEATER_COLUMNS: &str = "id, movie_name, release_date, language, states_json, genres_json, \
     cast_json, director, poster_url, source_url, dedup_key, agent_id, created_at";

const OTT_COLUMNS: &str = "id, movie_name, platform, content_type, release_date, language, \
     states_json, poster_url, source_url, dedup_key, agent_id, created_at";

const VIDEO_COLUMNS: &str = "id, video_id, channel_id, title, url, thumbnail_url, language, \
     states_json, category, published_at, status, agent_id, created_at";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// Filters for [`Storage::list_articles`]. `None` fields match everything.
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    pub status: Option<ContentStatus>,
    pub category: Option<String>,
    pub limit: u32,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        Self {
            status: None,
            category: None,
            limit: 50,
        }
    }
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TadkaError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(db_err)?;

        let conn = db.connect().map_err(db_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(db_err)?;

        let conn = db.connect().map_err(db_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    TadkaError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(TadkaError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    /// Run a `SELECT 1 ... LIMIT 1` style query and report whether it returned a row.
    async fn exists(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<bool> {
        let mut rows = self.conn.query(sql, params).await.map_err(db_err)?;
        Ok(rows.next().await.map_err(db_err)?.is_some())
    }

    // -----------------------------------------------------------------------
    // Agent operations
    // -----------------------------------------------------------------------

    /// Insert a new agent. Names are unique.
    pub async fn insert_agent(&self, agent: &AgentConfig) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO agents (id, name, kind, source_url, language, states_json, keywords_json,
                                     max_items, schedule_minutes, enabled, auto_publish, last_run_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    agent.id.as_str(),
                    agent.name.as_str(),
                    agent.kind.as_str(),
                    agent.source_url.as_deref(),
                    agent.language.map(|l| l.as_str()),
                    to_json(&agent.states),
                    to_json(&agent.keywords),
                    i64::from(agent.max_items),
                    i64::from(agent.schedule_minutes),
                    i64::from(agent.enabled),
                    i64::from(agent.auto_publish),
                    agent.last_run_at.map(|t| t.to_rfc3339()),
                    agent.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Get an agent by ID.
    pub async fn get_agent(&self, id: &str) -> Result<Option<AgentConfig>> {
        let sql = format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?1");
        let mut rows = self.conn.query(&sql, params![id]).await.map_err(db_err)?;
        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(row_to_agent(&row)?)),
            None => Ok(None),
        }
    }

    /// Get an agent by its unique name.
    pub async fn get_agent_by_name(&self, name: &str) -> Result<Option<AgentConfig>> {
        let sql = format!("SELECT {AGENT_COLUMNS} FROM agents WHERE name = ?1");
        let mut rows = self.conn.query(&sql, params![name]).await.map_err(db_err)?;
        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(row_to_agent(&row)?)),
            None => Ok(None),
        }
    }

    /// Resolve an agent from either its ID or its name.
    pub async fn find_agent(&self, id_or_name: &str) -> Result<Option<AgentConfig>> {
        match self.get_agent(id_or_name).await? {
            Some(agent) => Ok(Some(agent)),
            None => self.get_agent_by_name(id_or_name).await,
        }
    }

    /// List all agents, ordered by name.
    pub async fn list_agents(&self) -> Result<Vec<AgentConfig>> {
        let sql = format!("SELECT {AGENT_COLUMNS} FROM agents ORDER BY name");
        let mut rows = self.conn.query(&sql, params![]).await.map_err(db_err)?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(row_to_agent(&row)?);
        }
        Ok(results)
    }

    /// Enable or disable an agent. Returns `false` if no such agent exists.
    pub async fn set_agent_enabled(&self, id: &str, enabled: bool) -> Result<bool> {
        self.check_writable()?;
        let changed = self
            .conn
            .execute(
                "UPDATE agents SET enabled = ?1 WHERE id = ?2",
                params![i64::from(enabled), id],
            )
            .await
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    /// Record when an agent last finished a run.
    pub async fn mark_agent_run(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "UPDATE agents SET last_run_at = ?1 WHERE id = ?2",
                params![at.to_rfc3339(), id],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Delete an agent and its run history. Content it produced is kept.
    pub async fn delete_agent(&self, id: &str) -> Result<bool> {
        self.check_writable()?;
        self.conn
            .execute("DELETE FROM agent_runs WHERE agent_id = ?1", params![id])
            .await
            .map_err(db_err)?;
        let deleted = self
            .conn
            .execute("DELETE FROM agents WHERE id = ?1", params![id])
            .await
            .map_err(db_err)?;
        Ok(deleted > 0)
    }

    // -----------------------------------------------------------------------
    // Agent run operations
    // -----------------------------------------------------------------------

    /// Insert a new agent run. Returns the generated run ID.
    pub async fn start_agent_run(&self, agent_id: &str) -> Result<String> {
        self.check_writable()?;
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO agent_runs (id, agent_id, started_at) VALUES (?1, ?2, ?3)",
                params![id.as_str(), agent_id, now.as_str()],
            )
            .await
            .map_err(db_err)?;
        Ok(id)
    }

    /// Update an agent run with completion data.
    pub async fn finish_agent_run(&self, run_id: &str, stats_json: &str) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE agent_runs SET finished_at = ?1, stats_json = ?2 WHERE id = ?3",
                params![now.as_str(), stats_json, run_id],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Most recent runs for an agent, newest first.
    pub async fn list_agent_runs(&self, agent_id: &str, limit: u32) -> Result<Vec<AgentRun>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, agent_id, started_at, finished_at, stats_json
                 FROM agent_runs WHERE agent_id = ?1
                 ORDER BY started_at DESC LIMIT ?2",
                params![agent_id, i64::from(limit)],
            )
            .await
            .map_err(db_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(AgentRun {
                id: row.get::<String>(0).map_err(db_err)?,
                agent_id: row.get::<String>(1).map_err(db_err)?,
                started_at: parse_timestamp(&row.get::<String>(2).map_err(db_err)?)?,
                finished_at: opt_timestamp(row.get::<String>(3).ok())?,
                stats: row
                    .get::<String>(4)
                    .ok()
                    .and_then(|s| serde_json::from_str(&s).ok()),
            });
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Article operations
    // -----------------------------------------------------------------------

    /// Insert a new article.
    pub async fn insert_article(&self, article: &Article) -> Result<()> {
        self.check_writable()?;
        let review_json = article
            .review
            .as_ref()
            .map(|r| serde_json::to_string(r).map_err(|e| TadkaError::Storage(e.to_string())))
            .transpose()?;
        self.conn
            .execute(
                "INSERT INTO articles (id, title, slug, summary, content, category, language, states_json,
                                       image_url, source_url, dedup_key, review_json, status, agent_id,
                                       created_at, published_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    article.id.as_str(),
                    article.title.as_str(),
                    article.slug.as_str(),
                    article.summary.as_deref(),
                    article.content.as_str(),
                    article.category.as_str(),
                    article.language.map(|l| l.as_str()),
                    to_json(&article.states),
                    article.image_url.as_deref(),
                    article.source_url.as_deref(),
                    article.dedup_key.as_str(),
                    review_json,
                    article.status.as_str(),
                    article.agent_id.as_deref(),
                    article.created_at.to_rfc3339(),
                    article.published_at.map(|t| t.to_rfc3339()),
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Get an article by ID.
    pub async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1");
        let mut rows = self.conn.query(&sql, params![id]).await.map_err(db_err)?;
        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(row_to_article(&row)?)),
            None => Ok(None),
        }
    }

    /// Whether an article in `category` already has this identity key or source URL.
    pub async fn article_exists(
        &self,
        category: &str,
        dedup_key: &str,
        source_url: Option<&str>,
    ) -> Result<bool> {
        self.exists(
            "SELECT 1 FROM articles
             WHERE (category = ?1 AND dedup_key = ?2)
                OR (?3 IS NOT NULL AND source_url = ?3)
             LIMIT 1",
            params![category, dedup_key, source_url],
        )
        .await
    }

    /// Whether any article was created from `source_url`.
    pub async fn article_source_exists(&self, source_url: &str) -> Result<bool> {
        self.exists(
            "SELECT 1 FROM articles WHERE source_url = ?1 LIMIT 1",
            params![source_url],
        )
        .await
    }

    /// Whether an article already uses `slug`.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        self.exists(
            "SELECT 1 FROM articles WHERE slug = ?1 LIMIT 1",
            params![slug],
        )
        .await
    }

    /// List articles, newest first.
    pub async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR category = ?2)
             ORDER BY created_at DESC LIMIT ?3"
        );
        let mut rows = self
            .conn
            .query(
                &sql,
                params![
                    filter.status.map(|s| s.as_str()),
                    filter.category.as_deref(),
                    i64::from(filter.limit),
                ],
            )
            .await
            .map_err(db_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(row_to_article(&row)?);
        }
        Ok(results)
    }

    /// Change an article's status. Publishing stamps `published_at` the first time.
    pub async fn set_article_status(&self, id: &str, status: ContentStatus) -> Result<bool> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE articles SET status = ?1,
                    published_at = CASE WHEN ?1 = 'published' THEN COALESCE(published_at, ?2)
                                        ELSE published_at END
                 WHERE id = ?3",
                params![status.as_str(), now.as_str(), id],
            )
            .await
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    /// Delete an article by ID.
    pub async fn delete_article(&self, id: &str) -> Result<bool> {
        self.check_writable()?;
        let deleted = self
            .conn
            .execute("DELETE FROM articles WHERE id = ?1", params![id])
            .await
            .map_err(db_err)?;
        Ok(deleted > 0)
    }

    /// Full-text search across article titles and summaries.
    pub async fn search_articles(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>> {
        let mut rows = self
            .conn
            .query(
                "SELECT a.id, a.title, a.slug, rank
                 FROM articles_fts fts
                 JOIN articles a ON a.rowid = fts.rowid
                 WHERE articles_fts MATCH ?1
                 ORDER BY rank
                 LIMIT ?2",
                params![query, i64::from(limit)],
            )
            .await
            .map_err(db_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(SearchResult {
                id: row.get::<String>(0).map_err(db_err)?,
                title: row.get::<String>(1).map_err(db_err)?,
                slug: row.get::<String>(2).map_err(db_err)?,
                score: row.get::<f64>(3).unwrap_or(0.0),
            });
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Release operations
    // -----------------------------------------------------------------------

    /// Insert a theater release.
    pub async fn insert_theater_release(&self, release: &TheaterRelease) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO theater_releases (id, movie_name, release_date, language, states_json, genres_json,
                                               cast_json, director, poster_url, source_url, dedup_key, agent_id,
                                               created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    release.id.as_str(),
                    release.movie_name.as_str(),
                    release.release_date.format(DATE_FORMAT).to_string(),
                    release.language.map(|l| l.as_str()),
                    to_json(&release.states),
                    to_json(&release.genres),
                    to_json(&release.cast),
                    release.director.as_deref(),
                    release.poster_url.as_deref(),
                    release.source_url.as_deref(),
                    release.dedup_key.as_str(),
                    release.agent_id.as_deref(),
                    release.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Whether a theater release with this identity key exists.
    pub async fn theater_release_exists(&self, dedup_key: &str) -> Result<bool> {
        self.exists(
            "SELECT 1 FROM theater_releases WHERE dedup_key = ?1 LIMIT 1",
            params![dedup_key],
        )
        .await
    }

    /// Theater releases on or after `from`, soonest first.
    pub async fn list_theater_releases(
        &self,
        from: NaiveDate,
        limit: u32,
    ) -> Result<Vec<TheaterRelease>> {
        let sql = format!(
            "SELECT {THEATER_COLUMNS} FROM theater_releases
             WHERE release_date >= ?1 ORDER BY release_date, movie_name LIMIT ?2"
        );
        let mut rows = self
            .conn
            .query(
                &sql,
                params![from.format(DATE_FORMAT).to_string(), i64::from(limit)],
            )
            .await
            .map_err(db_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(row_to_theater_release(&row)?);
        }
        Ok(results)
    }

    /// Insert an OTT release.
    pub async fn insert_ott_release(&self, release: &OttRelease) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO ott_releases (id, movie_name, platform, content_type, release_date, language,
                                           states_json, poster_url, source_url, dedup_key, agent_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    release.id.as_str(),
                    release.movie_name.as_str(),
                    release.platform.as_str(),
                    release.content_type.as_str(),
                    release.release_date.format(DATE_FORMAT).to_string(),
                    release.language.map(|l| l.as_str()),
                    to_json(&release.states),
                    release.poster_url.as_deref(),
                    release.source_url.as_deref(),
                    release.dedup_key.as_str(),
                    release.agent_id.as_deref(),
                    release.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Whether an OTT release with this identity key exists.
    pub async fn ott_release_exists(&self, dedup_key: &str) -> Result<bool> {
        self.exists(
            "SELECT 1 FROM ott_releases WHERE dedup_key = ?1 LIMIT 1",
            params![dedup_key],
        )
        .await
    }

    /// OTT releases on or after `from`, soonest first.
    pub async fn list_ott_releases(&self, from: NaiveDate, limit: u32) -> Result<Vec<OttRelease>> {
        let sql = format!(
            "SELECT {OTT_COLUMNS} FROM ott_releases
             WHERE release_date >= ?1 ORDER BY release_date, movie_name LIMIT ?2"
        );
        let mut rows = self
            .conn
            .query(
                &sql,
                params![from.format(DATE_FORMAT).to_string(), i64::from(limit)],
            )
            .await
            .map_err(db_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(row_to_ott_release(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // YouTube operations
    // -----------------------------------------------------------------------

    /// Insert a channel, or update it if the YouTube channel id is already known.
    pub async fn upsert_channel(&self, channel: &YouTubeChannel) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO youtube_channels (id, name, channel_id, language, category, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(channel_id) DO UPDATE SET
                   name = excluded.name,
                   language = excluded.language,
                   category = excluded.category,
                   active = excluded.active",
                params![
                    channel.id.as_str(),
                    channel.name.as_str(),
                    channel.channel_id.as_str(),
                    channel.language.map(|l| l.as_str()),
                    channel.category.as_str(),
                    i64::from(channel.active),
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// List channels by name, optionally only active ones.
    pub async fn list_channels(&self, active_only: bool) -> Result<Vec<YouTubeChannel>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, channel_id, language, category, active
                 FROM youtube_channels WHERE (?1 = 0 OR active = 1) ORDER BY name",
                params![i64::from(active_only)],
            )
            .await
            .map_err(db_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(YouTubeChannel {
                id: row.get::<String>(0).map_err(db_err)?,
                name: row.get::<String>(1).map_err(db_err)?,
                channel_id: row.get::<String>(2).map_err(db_err)?,
                language: opt_language(row.get::<String>(3).ok()),
                category: row.get::<String>(4).map_err(db_err)?,
                active: row.get::<i64>(5).map_err(db_err)? != 0,
            });
        }
        Ok(results)
    }

    /// Insert a video. Returns `false` when the video id was already stored.
    pub async fn insert_video(&self, video: &YouTubeVideo) -> Result<bool> {
        self.check_writable()?;
        let inserted = self
            .conn
            .execute(
                "INSERT INTO youtube_videos (id, video_id, channel_id, title, url, thumbnail_url, language,
                                             states_json, category, published_at, status, agent_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT(video_id) DO NOTHING",
                params![
                    video.id.as_str(),
                    video.video_id.as_str(),
                    video.channel_id.as_str(),
                    video.title.as_str(),
                    video.url.as_str(),
                    video.thumbnail_url.as_deref(),
                    video.language.map(|l| l.as_str()),
                    to_json(&video.states),
                    video.category.as_str(),
                    video.published_at.map(|t| t.to_rfc3339()),
                    video.status.as_str(),
                    video.agent_id.as_deref(),
                    video.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(inserted > 0)
    }

    /// Whether a video id has already been stored.
    pub async fn video_exists(&self, video_id: &str) -> Result<bool> {
        self.exists(
            "SELECT 1 FROM youtube_videos WHERE video_id = ?1 LIMIT 1",
            params![video_id],
        )
        .await
    }

    /// Videos, newest published first, optionally for a single channel.
    pub async fn list_videos(
        &self,
        channel_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<YouTubeVideo>> {
        let sql = format!(
            "SELECT {VIDEO_COLUMNS} FROM youtube_videos
             WHERE (?1 IS NULL OR channel_id = ?1)
             ORDER BY COALESCE(published_at, created_at) DESC LIMIT ?2"
        );
        let mut rows = self
            .conn
            .query(&sql, params![channel_id, i64::from(limit)])
            .await
            .map_err(db_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(row_to_video(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Gallery operations
    // -----------------------------------------------------------------------

    /// Insert a gallery and its images in one transaction.
    pub async fn insert_gallery(&self, gallery: &Gallery) -> Result<()> {
        self.check_writable()?;
        let tx = self.conn.transaction().await.map_err(db_err)?;
        tx.execute(
            "INSERT INTO galleries (id, title, slug, entity_name, entity_slug, language, states_json,
                                    source_url, status, agent_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                gallery.id.as_str(),
                gallery.title.as_str(),
                gallery.slug.as_str(),
                gallery.entity_name.as_str(),
                gallery.entity_slug.as_str(),
                gallery.language.map(|l| l.as_str()),
                to_json(&gallery.states),
                gallery.source_url.as_str(),
                gallery.status.as_str(),
                gallery.agent_id.as_deref(),
                gallery.created_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(db_err)?;

        for image in &gallery.images {
            tx.execute(
                "INSERT INTO gallery_images (gallery_id, entity_slug, number, file_name, source_url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    gallery.id.as_str(),
                    gallery.entity_slug.as_str(),
                    i64::from(image.number),
                    image.file_name.as_str(),
                    image.source_url.as_str(),
                ],
            )
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    /// Get a gallery with its images.
    pub async fn get_gallery(&self, id: &str) -> Result<Option<Gallery>> {
        let sql = format!("SELECT {GALLERY_COLUMNS} FROM galleries WHERE id = ?1");
        let mut rows = self.conn.query(&sql, params![id]).await.map_err(db_err)?;
        let Some(row) = rows.next().await.map_err(db_err)? else {
            return Ok(None);
        };
        let mut gallery = row_to_gallery(&row)?;
        gallery.images = self.gallery_images(id).await?;
        Ok(Some(gallery))
    }

    /// List galleries (without images), newest first.
    pub async fn list_galleries(&self, limit: u32) -> Result<Vec<Gallery>> {
        let sql = format!(
            "SELECT {GALLERY_COLUMNS} FROM galleries ORDER BY created_at DESC LIMIT ?1"
        );
        let mut rows = self
            .conn
            .query(&sql, params![i64::from(limit)])
            .await
            .map_err(db_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(row_to_gallery(&row)?);
        }
        Ok(results)
    }

    async fn gallery_images(&self, gallery_id: &str) -> Result<Vec<GalleryImage>> {
        let mut rows = self
            .conn
            .query(
                "SELECT number, file_name, source_url FROM gallery_images
                 WHERE gallery_id = ?1 ORDER BY number",
                params![gallery_id],
            )
            .await
            .map_err(db_err)?;

        let mut images = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            images.push(GalleryImage {
                number: row.get::<u32>(0).map_err(db_err)?,
                file_name: row.get::<String>(1).map_err(db_err)?,
                source_url: row.get::<String>(2).map_err(db_err)?,
            });
        }
        Ok(images)
    }

    /// Whether a gallery was already created from `source_url`.
    pub async fn gallery_exists_for_source(&self, source_url: &str) -> Result<bool> {
        self.exists(
            "SELECT 1 FROM galleries WHERE source_url = ?1 LIMIT 1",
            params![source_url],
        )
        .await
    }

    /// Image numbers already recorded for an entity, ascending.
    pub async fn gallery_image_numbers(&self, entity_slug: &str) -> Result<Vec<u32>> {
        let mut rows = self
            .conn
            .query(
                "SELECT number FROM gallery_images WHERE entity_slug = ?1 ORDER BY number",
                params![entity_slug],
            )
            .await
            .map_err(db_err)?;

        let mut numbers = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            numbers.push(row.get::<u32>(0).map_err(db_err)?);
        }
        Ok(numbers)
    }

    /// Delete a gallery and its image rows.
    pub async fn delete_gallery(&self, id: &str) -> Result<bool> {
        self.check_writable()?;
        let tx = self.conn.transaction().await.map_err(db_err)?;
        tx.execute(
            "DELETE FROM gallery_images WHERE gallery_id = ?1",
            params![id],
        )
        .await
        .map_err(db_err)?;
        let deleted = tx
            .execute("DELETE FROM galleries WHERE id = ?1", params![id])
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(deleted > 0)
    }
}

/// A search result from FTS5.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub slug: String,
    /// FTS5 rank score (lower is better).
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Row conversion helpers
// ---------------------------------------------------------------------------

fn db_err(e: impl std::fmt::Display) -> TadkaError {
    TadkaError::Storage(e.to_string())
}

fn to_json(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".into())
}

fn from_json(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| TadkaError::Storage(format!("invalid JSON list: {e}")))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TadkaError::Storage(format!("invalid date: {e}")))
}

fn opt_timestamp(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_timestamp).transpose()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| TadkaError::Storage(format!("invalid release date '{s}': {e}")))
}

fn opt_language(s: Option<String>) -> Option<Language> {
    s.and_then(|s| s.parse().ok())
}

fn parse_status(s: &str) -> Result<ContentStatus> {
    s.parse()
        .map_err(|e: TadkaError| TadkaError::Storage(e.to_string()))
}

fn row_to_agent(row: &libsql::Row) -> Result<AgentConfig> {
    let kind: String = row.get(2).map_err(db_err)?;
    Ok(AgentConfig {
        id: row.get::<String>(0).map_err(db_err)?,
        name: row.get::<String>(1).map_err(db_err)?,
        kind: kind
            .parse()
            .map_err(|e: TadkaError| TadkaError::Storage(e.to_string()))?,
        source_url: row.get::<String>(3).ok(),
        language: opt_language(row.get::<String>(4).ok()),
        states: from_json(&row.get::<String>(5).map_err(db_err)?)?,
        keywords: from_json(&row.get::<String>(6).map_err(db_err)?)?,
        max_items: row.get::<u32>(7).map_err(db_err)?,
        schedule_minutes: row.get::<u32>(8).map_err(db_err)?,
        enabled: row.get::<i64>(9).map_err(db_err)? != 0,
        auto_publish: row.get::<i64>(10).map_err(db_err)? != 0,
        last_run_at: opt_timestamp(row.get::<String>(11).ok())?,
        created_at: parse_timestamp(&row.get::<String>(12).map_err(db_err)?)?,
    })
}

fn row_to_article(row: &libsql::Row) -> Result<Article> {
    Ok(Article {
        id: row.get::<String>(0).map_err(db_err)?,
        title: row.get::<String>(1).map_err(db_err)?,
        slug: row.get::<String>(2).map_err(db_err)?,
        summary: row.get::<String>(3).ok(),
        content: row.get::<String>(4).map_err(db_err)?,
        category: row.get::<String>(5).map_err(db_err)?,
        language: opt_language(row.get::<String>(6).ok()),
        states: from_json(&row.get::<String>(7).map_err(db_err)?)?,
        image_url: row.get::<String>(8).ok(),
        source_url: row.get::<String>(9).ok(),
        dedup_key: row.get::<String>(10).map_err(db_err)?,
        review: row
            .get::<String>(11)
            .ok()
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| TadkaError::Storage(format!("invalid review JSON: {e}")))?,
        status: parse_status(&row.get::<String>(12).map_err(db_err)?)?,
        agent_id: row.get::<String>(13).ok(),
        created_at: parse_timestamp(&row.get::<String>(14).map_err(db_err)?)?,
        published_at: opt_timestamp(row.get::<String>(15).ok())?,
    })
}

fn row_to_gallery(row: &libsql::Row) -> Result<Gallery> {
    Ok(Gallery {
        id: row.get::<String>(0).map_err(db_err)?,
        title: row.get::<String>(1).map_err(db_err)?,
        slug: row.get::<String>(2).map_err(db_err)?,
        entity_name: row.get::<String>(3).map_err(db_err)?,
        entity_slug: row.get::<String>(4).map_err(db_err)?,
        images: Vec::new(),
        language: opt_language(row.get::<String>(5).ok()),
        states: from_json(&row.get::<String>(6).map_err(db_err)?)?,
        source_url: row.get::<String>(7).map_err(db_err)?,
        status: parse_status(&row.get::<String>(8).map_err(db_err)?)?,
        agent_id: row.get::<String>(9).ok(),
        created_at: parse_timestamp(&row.get::<String>(10).map_err(db_err)?)?,
    })
}

fn row_to_theater_release(row: &libsql::Row) -> Result<TheaterRelease> {
    Ok(TheaterRelease {
        id: row.get::<String>(0).map_err(db_err)?,
        movie_name: row.get::<String>(1).map_err(db_err)?,
        release_date: parse_date(&row.get::<String>(2).map_err(db_err)?)?,
        language: opt_language(row.get::<String>(3).ok()),
        states: from_json(&row.get::<String>(4).map_err(db_err)?)?,
        genres: from_json(&row.get::<String>(5).map_err(db_err)?)?,
        cast: from_json(&row.get::<String>(6).map_err(db_err)?)?,
        director: row.get::<String>(7).ok(),
        poster_url: row.get::<String>(8).ok(),
        source_url: row.get::<String>(9).ok(),
        dedup_key: row.get::<String>(10).map_err(db_err)?,
        agent_id: row.get::<String>(11).ok(),
        created_at: parse_timestamp(&row.get::<String>(12).map_err(db_err)?)?,
    })
}

fn row_to_ott_release(row: &libsql::Row) -> Result<OttRelease> {
    let content_type: String = row.get(3).map_err(db_err)?;
    Ok(OttRelease {
        id: row.get::<String>(0).map_err(db_err)?,
        movie_name: row.get::<String>(1).map_err(db_err)?,
        platform: row.get::<String>(2).map_err(db_err)?,
        content_type: content_type
            .parse::<ContentType>()
            .map_err(|e| TadkaError::Storage(e.to_string()))?,
        release_date: parse_date(&row.get::<String>(4).map_err(db_err)?)?,
        language: opt_language(row.get::<String>(5).ok()),
        states: from_json(&row.get::<String>(6).map_err(db_err)?)?,
        poster_url: row.get::<String>(7).ok(),
        source_url: row.get::<String>(8).ok(),
        dedup_key: row.get::<String>(9).map_err(db_err)?,
        agent_id: row.get::<String>(10).ok(),
        created_at: parse_timestamp(&row.get::<String>(11).map_err(db_err)?)?,
    })
}

fn row_to_video(row: &libsql::Row) -> Result<YouTubeVideo> {
    Ok(YouTubeVideo {
        id: row.get::<String>(0).map_err(db_err)?,
        video_id: row.get::<String>(1).map_err(db_err)?,
        channel_id: row.get::<String>(2).map_err(db_err)?,
        title: row.get::<String>(3).map_err(db_err)?,
        url: row.get::<String>(4).map_err(db_err)?,
        thumbnail_url: row.get::<String>(5).ok(),
        language: opt_language(row.get::<String>(6).ok()),
        states: from_json(&row.get::<String>(7).map_err(db_err)?)?,
        category: row.get::<String>(8).map_err(db_err)?,
        published_at: opt_timestamp(row.get::<String>(9).ok())?,
        status: parse_status(&row.get::<String>(10).map_err(db_err)?)?,
        agent_id: row.get::<String>(11).ok(),
        created_at: parse_timestamp(&row.get::<String>(12).map_err(db_err)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tadka_shared::{AgentKind, RecordId, ReviewDetails};

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("tadka_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn sample_article(title: &str, dedup_key: &str, source_url: &str) -> Article {
        Article {
            id: RecordId::new().to_string(),
            title: title.into(),
            slug: dedup_key.into(),
            summary: Some(format!("{title} summary")),
            content: "<p>Review body</p>".into(),
            category: "movie-reviews".into(),
            language: Some(Language::Telugu),
            states: vec!["ap".into(), "ts".into()],
            image_url: None,
            source_url: Some(source_url.into()),
            dedup_key: dedup_key.into(),
            review: Some(ReviewDetails {
                movie_title: title.into(),
                rating: Some(3.5),
                ..Default::default()
            }),
            status: ContentStatus::Draft,
            agent_id: None,
            created_at: Utc::now(),
            published_at: None,
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("tadka_test_{}.db", Uuid::now_v7()));
        let _s1 = Storage::open(&tmp).await.expect("first open");
        drop(_s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn agent_crud() {
        let storage = test_storage().await;
        let mut agent = AgentConfig::new("telugu-reviews", AgentKind::MovieReview);
        agent.source_url = Some("https://reviews.example.com/telugu".into());
        agent.language = Some(Language::Telugu);
        agent.states = vec!["ap".into(), "ts".into()];
        agent.schedule_minutes = 60;

        storage.insert_agent(&agent).await.expect("insert agent");

        let found = storage
            .find_agent("telugu-reviews")
            .await
            .expect("find by name")
            .expect("agent exists");
        assert_eq!(found.id, agent.id);
        assert_eq!(found.kind, AgentKind::MovieReview);
        assert_eq!(found.language, Some(Language::Telugu));
        assert_eq!(found.states, vec!["ap", "ts"]);
        assert!(found.last_run_at.is_none());

        let now = Utc::now();
        storage.mark_agent_run(&agent.id, now).await.unwrap();
        assert!(storage.set_agent_enabled(&agent.id, false).await.unwrap());
        let found = storage.get_agent(&agent.id).await.unwrap().unwrap();
        assert!(!found.enabled);
        assert!(found.last_run_at.is_some());

        // Names are unique
        let dup = AgentConfig::new("telugu-reviews", AgentKind::Video);
        assert!(storage.insert_agent(&dup).await.is_err());

        assert!(storage.delete_agent(&agent.id).await.unwrap());
        assert!(storage.list_agents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn agent_run_lifecycle() {
        let storage = test_storage().await;
        let agent = AgentConfig::new("trailers", AgentKind::Video);
        storage.insert_agent(&agent).await.unwrap();

        let run_id = storage.start_agent_run(&agent.id).await.expect("start run");
        storage
            .finish_agent_run(&run_id, r#"{"created": 4}"#)
            .await
            .expect("finish run");

        let runs = storage.list_agent_runs(&agent.id, 5).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].finished_at.is_some());
        assert_eq!(runs[0].stats.as_ref().unwrap()["created"], 4);
    }

    #[tokio::test]
    async fn article_dedup_lookups() {
        let storage = test_storage().await;
        let article = sample_article("Devara", "devara-telugu", "https://r.example.com/devara");
        storage.insert_article(&article).await.expect("insert article");

        assert!(
            storage
                .article_exists("movie-reviews", "devara-telugu", None)
                .await
                .unwrap()
        );
        // Same source URL, different key
        assert!(
            storage
                .article_exists("movie-reviews", "other", Some("https://r.example.com/devara"))
                .await
                .unwrap()
        );
        // Same key in another category is not a duplicate
        assert!(
            !storage
                .article_exists("ott-reviews", "devara-telugu", None)
                .await
                .unwrap()
        );
        assert!(storage.slug_exists("devara-telugu").await.unwrap());
        assert!(
            storage
                .article_source_exists("https://r.example.com/devara")
                .await
                .unwrap()
        );

        let loaded = storage.get_article(&article.id).await.unwrap().unwrap();
        assert_eq!(loaded.review.unwrap().rating, Some(3.5));
        assert_eq!(loaded.language, Some(Language::Telugu));
    }

    #[tokio::test]
    async fn article_status_and_listing() {
        let storage = test_storage().await;
        let a = sample_article("Kalki", "kalki", "https://r.example.com/kalki");
        let b = sample_article("Pushpa", "pushpa", "https://r.example.com/pushpa");
        storage.insert_article(&a).await.unwrap();
        storage.insert_article(&b).await.unwrap();

        assert!(
            storage
                .set_article_status(&a.id, ContentStatus::Published)
                .await
                .unwrap()
        );

        let published = storage
            .list_articles(&ArticleFilter {
                status: Some(ContentStatus::Published),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, a.id);
        assert!(published[0].published_at.is_some());

        let all = storage.list_articles(&ArticleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        assert!(storage.delete_article(&b.id).await.unwrap());
        assert!(storage.get_article(&b.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleted_article_frees_source_and_search() {
        let storage = test_storage().await;
        let article = sample_article("Pushpa", "pushpa", "https://r.example.com/pushpa");
        storage.insert_article(&article).await.unwrap();
        assert_eq!(storage.search_articles("Pushpa", 10).await.unwrap().len(), 1);

        assert!(storage.delete_article(&article.id).await.unwrap());
        // Unknown IDs report nothing deleted
        assert!(!storage.delete_article(&article.id).await.unwrap());
        assert!(
            !storage
                .article_source_exists("https://r.example.com/pushpa")
                .await
                .unwrap()
        );
        assert!(!storage.slug_exists("pushpa").await.unwrap());
        assert!(storage.search_articles("Pushpa", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fts_search() {
        let storage = test_storage().await;
        for (title, key) in [
            ("Devara Part 1 Review", "devara"),
            ("Amaran Review", "amaran"),
            ("Lucky Baskhar Review", "lucky-baskhar"),
        ] {
            let article = sample_article(title, key, &format!("https://r.example.com/{key}"));
            storage.insert_article(&article).await.unwrap();
        }

        let results = storage.search_articles("amaran", 10).await.expect("search");
        assert!(!results.is_empty());
        assert_eq!(results[0].slug, "amaran");
    }

    #[tokio::test]
    async fn release_operations() {
        let storage = test_storage().await;
        let date = NaiveDate::from_ymd_opt(2026, 11, 14).unwrap();
        let theater = TheaterRelease {
            id: RecordId::new().to_string(),
            movie_name: "Kanguva".into(),
            release_date: date,
            language: Some(Language::Tamil),
            states: vec!["tn".into()],
            genres: vec!["Action".into()],
            cast: vec!["Suriya".into()],
            director: Some("Siva".into()),
            poster_url: None,
            source_url: None,
            dedup_key: "kanguva-tamil".into(),
            agent_id: None,
            created_at: Utc::now(),
        };
        storage.insert_theater_release(&theater).await.unwrap();
        assert!(storage.theater_release_exists("kanguva-tamil").await.unwrap());
        assert!(storage.insert_theater_release(&theater).await.is_err());

        let ott = OttRelease {
            id: RecordId::new().to_string(),
            movie_name: "Kanguva".into(),
            platform: "Prime Video".into(),
            content_type: ContentType::Movie,
            release_date: date,
            language: Some(Language::Tamil),
            states: vec!["tn".into()],
            poster_url: None,
            source_url: None,
            dedup_key: "kanguva-tamil-prime-video".into(),
            agent_id: None,
            created_at: Utc::now(),
        };
        storage.insert_ott_release(&ott).await.unwrap();

        let earlier = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        assert_eq!(storage.list_theater_releases(earlier, 10).await.unwrap().len(), 1);
        assert!(storage.list_theater_releases(later, 10).await.unwrap().is_empty());
        let otts = storage.list_ott_releases(earlier, 10).await.unwrap();
        assert_eq!(otts[0].platform, "Prime Video");
        assert_eq!(otts[0].release_date, date);
    }

    #[tokio::test]
    async fn youtube_channels_and_videos() {
        let storage = test_storage().await;
        let channel = YouTubeChannel {
            id: RecordId::new().to_string(),
            name: "Studio Official".into(),
            channel_id: "UCabc".into(),
            language: Some(Language::Hindi),
            category: "trailers".into(),
            active: true,
        };
        storage.upsert_channel(&channel).await.unwrap();
        // Re-upsert with a new name updates in place
        let renamed = YouTubeChannel {
            id: RecordId::new().to_string(),
            name: "Studio Music".into(),
            active: false,
            ..channel.clone()
        };
        storage.upsert_channel(&renamed).await.unwrap();
        let all = storage.list_channels(false).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Studio Music");
        assert!(storage.list_channels(true).await.unwrap().is_empty());

        let video = YouTubeVideo {
            id: RecordId::new().to_string(),
            video_id: "dQw4w9WgXcQ".into(),
            channel_id: "UCabc".into(),
            title: "Official Trailer".into(),
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into(),
            thumbnail_url: None,
            language: Some(Language::Hindi),
            states: vec!["up".into()],
            category: "trailers".into(),
            published_at: Some(Utc::now()),
            status: ContentStatus::Published,
            agent_id: None,
            created_at: Utc::now(),
        };
        assert!(storage.insert_video(&video).await.unwrap());
        let again = YouTubeVideo {
            id: RecordId::new().to_string(),
            ..video.clone()
        };
        assert!(!storage.insert_video(&again).await.unwrap());
        assert!(storage.video_exists("dQw4w9WgXcQ").await.unwrap());
        assert_eq!(storage.list_videos(Some("UCabc"), 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn gallery_operations() {
        let storage = test_storage().await;
        let gallery = Gallery {
            id: RecordId::new().to_string(),
            title: "Samantha latest photos".into(),
            slug: "samantha-latest-photos".into(),
            entity_name: "Samantha".into(),
            entity_slug: "samantha".into(),
            images: vec![
                GalleryImage {
                    number: 1,
                    file_name: "samantha-1.jpg".into(),
                    source_url: "https://cdn.example.com/a.jpg".into(),
                },
                GalleryImage {
                    number: 2,
                    file_name: "samantha-2.jpg".into(),
                    source_url: "https://cdn.example.com/b.jpg".into(),
                },
            ],
            language: None,
            states: vec!["all".into()],
            source_url: "https://www.instagram.com/p/ABC123/".into(),
            status: ContentStatus::Draft,
            agent_id: None,
            created_at: Utc::now(),
        };
        storage.insert_gallery(&gallery).await.expect("insert gallery");

        assert!(
            storage
                .gallery_exists_for_source("https://www.instagram.com/p/ABC123/")
                .await
                .unwrap()
        );
        assert_eq!(
            storage.gallery_image_numbers("samantha").await.unwrap(),
            vec![1, 2]
        );

        let loaded = storage.get_gallery(&gallery.id).await.unwrap().unwrap();
        assert_eq!(loaded.images.len(), 2);
        assert_eq!(loaded.images[1].file_name, "samantha-2.jpg");
        assert_eq!(storage.list_galleries(10).await.unwrap().len(), 1);

        assert!(storage.delete_gallery(&gallery.id).await.unwrap());
        assert!(storage.gallery_image_numbers("samantha").await.unwrap().is_empty());
        assert!(storage.get_gallery(&gallery.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("tadka_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.insert_agent(&AgentConfig::new("a1", AgentKind::Video))
            .await
            .unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        let result = ro
            .insert_agent(&AgentConfig::new("a2", AgentKind::Video))
            .await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
        assert_eq!(ro.list_agents().await.unwrap().len(), 1);
    }
}
