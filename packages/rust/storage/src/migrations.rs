//! SQL migration definitions for the Tadka CMS database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as one batch.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: agents, agent_runs, articles, galleries, releases, youtube",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Configured agents
CREATE TABLE IF NOT EXISTS agents (
    id               TEXT PRIMARY KEY,
    name             TEXT NOT NULL UNIQUE,
    kind             TEXT NOT NULL,
    source_url       TEXT,
    language         TEXT,
    states_json      TEXT NOT NULL DEFAULT '[]',
    keywords_json    TEXT NOT NULL DEFAULT '[]',
    max_items        INTEGER NOT NULL,
    schedule_minutes INTEGER NOT NULL,
    enabled          INTEGER NOT NULL,
    auto_publish     INTEGER NOT NULL,
    last_run_at      TEXT,
    created_at       TEXT NOT NULL
);

-- Agent run history
CREATE TABLE IF NOT EXISTS agent_runs (
    id          TEXT PRIMARY KEY,
    agent_id    TEXT NOT NULL,
    started_at  TEXT NOT NULL,
    finished_at TEXT,
    stats_json  TEXT
);

CREATE INDEX IF NOT EXISTS idx_agent_runs_agent ON agent_runs(agent_id);

-- Articles (reviews and news)
CREATE TABLE IF NOT EXISTS articles (
    id           TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    slug         TEXT NOT NULL UNIQUE,
    summary      TEXT,
    content      TEXT NOT NULL,
    category     TEXT NOT NULL,
    language     TEXT,
    states_json  TEXT NOT NULL,
    image_url    TEXT,
    source_url   TEXT,
    dedup_key    TEXT NOT NULL,
    review_json  TEXT,
    status       TEXT NOT NULL,
    agent_id     TEXT,
    created_at   TEXT NOT NULL,
    published_at TEXT,
    UNIQUE(category, dedup_key)
);

CREATE INDEX IF NOT EXISTS idx_articles_source_url ON articles(source_url);
CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status);

-- Image galleries
CREATE TABLE IF NOT EXISTS galleries (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    slug        TEXT NOT NULL,
    entity_name TEXT NOT NULL,
    entity_slug TEXT NOT NULL,
    language    TEXT,
    states_json TEXT NOT NULL,
    source_url  TEXT NOT NULL UNIQUE,
    status      TEXT NOT NULL,
    agent_id    TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS gallery_images (
    gallery_id  TEXT NOT NULL REFERENCES galleries(id) ON DELETE CASCADE,
    entity_slug TEXT NOT NULL,
    number      INTEGER NOT NULL,
    file_name   TEXT NOT NULL,
    source_url  TEXT NOT NULL,
    PRIMARY KEY (entity_slug, number)
);

CREATE INDEX IF NOT EXISTS idx_gallery_images_gallery ON gallery_images(gallery_id);

-- Theater release calendar
CREATE TABLE IF NOT EXISTS theater_releases (
    id           TEXT PRIMARY KEY,
    movie_name   TEXT NOT NULL,
    release_date TEXT NOT NULL,
    language     TEXT,
    states_json  TEXT NOT NULL,
    genres_json  TEXT NOT NULL DEFAULT '[]',
    cast_json    TEXT NOT NULL DEFAULT '[]',
    director     TEXT,
    poster_url   TEXT,
    source_url   TEXT,
    dedup_key    TEXT NOT NULL UNIQUE,
    agent_id     TEXT,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_theater_release_date ON theater_releases(release_date);

-- OTT release calendar
CREATE TABLE IF NOT EXISTS ott_releases (
    id           TEXT PRIMARY KEY,
    movie_name   TEXT NOT NULL,
    platform     TEXT NOT NULL,
    content_type TEXT NOT NULL,
    release_date TEXT NOT NULL,
    language     TEXT,
    states_json  TEXT NOT NULL,
    poster_url   TEXT,
    source_url   TEXT,
    dedup_key    TEXT NOT NULL UNIQUE,
    agent_id     TEXT,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ott_release_date ON ott_releases(release_date);

-- YouTube channels and videos
CREATE TABLE IF NOT EXISTS youtube_channels (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    channel_id TEXT NOT NULL UNIQUE,
    language   TEXT,
    category   TEXT NOT NULL,
    active     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS youtube_videos (
    id            TEXT PRIMARY KEY,
    video_id      TEXT NOT NULL UNIQUE,
    channel_id    TEXT NOT NULL,
    title         TEXT NOT NULL,
    url           TEXT NOT NULL,
    thumbnail_url TEXT,
    language      TEXT,
    states_json   TEXT NOT NULL,
    category      TEXT NOT NULL,
    published_at  TEXT,
    status        TEXT NOT NULL,
    agent_id      TEXT,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_youtube_videos_channel ON youtube_videos(channel_id);

-- Full-text search on article titles and summaries
CREATE VIRTUAL TABLE IF NOT EXISTS articles_fts USING fts5(
    title,
    summary,
    content=articles,
    content_rowid=rowid
);

CREATE TRIGGER IF NOT EXISTS articles_fts_insert AFTER INSERT ON articles BEGIN
    INSERT INTO articles_fts(rowid, title, summary)
    VALUES (new.rowid, new.title, new.summary);
END;

CREATE TRIGGER IF NOT EXISTS articles_fts_delete AFTER DELETE ON articles BEGIN
    INSERT INTO articles_fts(articles_fts, rowid, title, summary)
    VALUES ('delete', old.rowid, old.title, old.summary);
END;

CREATE TRIGGER IF NOT EXISTS articles_fts_update AFTER UPDATE ON articles BEGIN
    INSERT INTO articles_fts(articles_fts, rowid, title, summary)
    VALUES ('delete', old.rowid, old.title, old.summary);
    INSERT INTO articles_fts(rowid, title, summary)
    VALUES (new.rowid, new.title, new.summary);
END;

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
    ]
}
