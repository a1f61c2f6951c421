//! Agent runs: fetch → parse → dedup → normalize → write for one agent.
//!
//! Each kind lives in its own submodule. A run never aborts on a single bad
//! page, row, feed, or image: the failure is logged, counted in the report,
//! and the run moves on.

mod releases;
mod reviews;
mod tadka_pics;
mod video;

use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};
use url::Url;

use tadka_shared::{
    AgentConfig, AgentKind, AppConfig, FetchConfig, Language, Result, TadkaError, expand_home,
};
use tadka_sources::{Fetcher, INSTAGRAM_BASE, ParserRegistry, YOUTUBE_FEED_BASE};
use tadka_storage::Storage;

use crate::media::MediaStore;
use crate::writer::{MOVIE_REVIEWS, OTT_REVIEWS};

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything an agent run needs: database, HTTP client, media store, parsers.
pub struct AgentContext {
    pub storage: Storage,
    pub fetcher: Fetcher,
    pub media: MediaStore,
    pub parsers: ParserRegistry,
    /// Language used when neither the agent nor the content names one.
    pub default_language: Option<Language>,
    /// YouTube feed endpoint (overridden in tests).
    pub feed_base: String,
    /// Origin Instagram post and embed pages are fetched from.
    pub instagram_base: String,
}

impl AgentContext {
    pub fn new(storage: Storage, fetcher: Fetcher, media: MediaStore) -> Self {
        Self {
            storage,
            fetcher,
            media,
            parsers: ParserRegistry::new(),
            default_language: None,
            feed_base: YOUTUBE_FEED_BASE.to_string(),
            instagram_base: INSTAGRAM_BASE.to_string(),
        }
    }

    /// Open storage and the media store at the configured paths.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let db_path = expand_home(&config.defaults.database_path)?;
        let storage = Storage::open(&db_path).await?;
        let media = MediaStore::open(expand_home(&config.defaults.media_dir)?)?;
        let fetcher = Fetcher::new(FetchConfig::from(config))?;

        let mut ctx = Self::new(storage, fetcher, media);
        ctx.default_language = config.defaults.default_language;
        Ok(ctx)
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for agent runs.
pub trait AgentProgress: Send + Sync {
    /// Called before the first request of a run.
    fn agent_started(&self, agent: &AgentConfig);
    /// Called before each page, feed, or image request.
    fn fetching(&self, url: &str);
    /// Called after a record is written.
    fn created(&self, title: &str, count: u32);
    /// Called when the run is recorded.
    fn agent_finished(&self, report: &AgentRunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl AgentProgress for SilentProgress {
    fn agent_started(&self, _agent: &AgentConfig) {}
    fn fetching(&self, _url: &str) {}
    fn created(&self, _title: &str, _count: u32) {}
    fn agent_finished(&self, _report: &AgentRunReport) {}
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of one agent run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRunReport {
    pub run_id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub kind: AgentKind,
    /// Records written.
    pub created: u32,
    /// Candidates rejected as already present.
    pub duplicates: u32,
    /// Candidates dropped for missing fields or filters.
    pub skipped: u32,
    /// One message per failed page, row, feed, or image.
    pub errors: Vec<String>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Running counters for a run.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub created: u32,
    pub duplicates: u32,
    pub skipped: u32,
    pub errors: Vec<String>,
}

impl Tally {
    /// Log and record a failure for one item.
    pub fn error(&mut self, context: &str, err: &TadkaError) {
        warn!(context, error = %err, "agent item failed");
        self.errors.push(format!("{context}: {err}"));
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run one agent to completion and record the run.
///
/// Returns an error only when the agent is misconfigured or the run cannot
/// be recorded. Fetch and parse failures end up in
/// [`AgentRunReport::errors`].
#[instrument(skip_all, fields(agent = %agent.name, kind = %agent.kind))]
pub async fn run_agent(
    ctx: &AgentContext,
    agent: &AgentConfig,
    progress: &dyn AgentProgress,
) -> Result<AgentRunReport> {
    let source = source_url(agent)?;
    let start = Instant::now();

    info!(agent_id = %agent.id, "starting agent run");
    progress.agent_started(agent);
    let run_id = ctx.storage.start_agent_run(&agent.id).await?;

    let mut tally = Tally::default();
    let outcome = match (agent.kind, &source) {
        (AgentKind::MovieReview, Some(url)) => {
            reviews::run(ctx, agent, url, MOVIE_REVIEWS, &mut tally, progress).await
        }
        (AgentKind::OttReview, Some(url)) => {
            reviews::run(ctx, agent, url, OTT_REVIEWS, &mut tally, progress).await
        }
        (AgentKind::TheaterRelease, Some(url)) => {
            releases::run_theater(ctx, agent, url, &mut tally, progress).await
        }
        (AgentKind::OttRelease, Some(url)) => {
            releases::run_ott(ctx, agent, url, &mut tally, progress).await
        }
        (AgentKind::Video, _) => video::run(ctx, agent, &mut tally, progress).await,
        (AgentKind::TadkaPics, Some(url)) => {
            tadka_pics::run(ctx, agent, url, &mut tally, progress).await
        }
        (_, None) => Ok(()),
    };
    if let Err(e) = outcome {
        let context = source.as_ref().map_or("run", Url::as_str);
        tally.error(context, &e);
    }

    let report = AgentRunReport {
        run_id: run_id.clone(),
        agent_id: agent.id.clone(),
        agent_name: agent.name.clone(),
        kind: agent.kind,
        created: tally.created,
        duplicates: tally.duplicates,
        skipped: tally.skipped,
        errors: tally.errors,
        duration: start.elapsed(),
    };

    let stats = serde_json::to_string(&report)
        .map_err(|e| TadkaError::Storage(format!("failed to encode run stats: {e}")))?;
    ctx.storage.finish_agent_run(&run_id, &stats).await?;
    ctx.storage.mark_agent_run(&agent.id, Utc::now()).await?;

    info!(
        created = report.created,
        duplicates = report.duplicates,
        skipped = report.skipped,
        errors = report.errors.len(),
        elapsed_ms = report.duration.as_millis() as u64,
        "agent run finished"
    );
    progress.agent_finished(&report);
    Ok(report)
}

fn source_url(agent: &AgentConfig) -> Result<Option<Url>> {
    match agent.source_url.as_deref() {
        Some(raw) => Url::parse(raw).map(Some).map_err(|e| {
            TadkaError::validation(format!("agent '{}' has invalid source_url '{raw}': {e}", agent.name))
        }),
        None if agent.kind.requires_source_url() => Err(TadkaError::validation(format!(
            "agent '{}' ({}) needs a source_url",
            agent.name, agent.kind
        ))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests;
