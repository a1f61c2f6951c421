//! Theater and OTT release agents: release calendar tables → release records.

use scraper::Html;
use tracing::debug;
use url::Url;

use tadka_shared::{AgentConfig, Result};
use tadka_sources::{ScrapedRelease, parse_release_tables};

use super::{AgentContext, AgentProgress, Tally};
use crate::dedup::{Collection, Deduplicator, identity_key};
use crate::normalize::Normalizer;
use crate::writer::Writer;

async fn fetch_rows(
    ctx: &AgentContext,
    source: &Url,
    progress: &dyn AgentProgress,
) -> Result<Vec<ScrapedRelease>> {
    progress.fetching(source.as_str());
    let page = ctx.fetcher.fetch_page(source).await?;
    let rows = parse_rows(&page.body, source);
    debug!(rows = rows.len(), "release rows parsed");
    Ok(rows)
}

fn parse_rows(body: &str, base: &Url) -> Vec<ScrapedRelease> {
    let doc = Html::parse_document(body);
    parse_release_tables(&doc, base)
}

pub(super) async fn run_theater(
    ctx: &AgentContext,
    agent: &AgentConfig,
    source: &Url,
    tally: &mut Tally,
    progress: &dyn AgentProgress,
) -> Result<()> {
    let rows = fetch_rows(ctx, source, progress).await?;
    let limit = agent.max_items.max(1);
    let normalizer = Normalizer::new(agent, ctx.default_language);
    let mut dedup = Deduplicator::new();
    let writer = Writer::new(&ctx.storage, agent);

    for row in rows {
        if tally.created >= limit {
            break;
        }
        let tags = normalizer.normalize(row.language_hint.as_deref(), &[row.movie_name.as_str()]);
        let language = tags.language.map(|l| l.as_str()).unwrap_or_default();
        let key = identity_key(&row.movie_name, &[language]);

        match dedup
            .accept(&ctx.storage, Collection::TheaterReleases, &key, None)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tally.duplicates += 1;
                continue;
            }
            Err(e) => {
                tally.error(&row.movie_name, &e);
                continue;
            }
        }

        match writer.write_theater_release(&row, key, &tags).await {
            Ok(record) => {
                tally.created += 1;
                progress.created(&record.movie_name, tally.created);
            }
            Err(e) => tally.error(&row.movie_name, &e),
        }
    }
    Ok(())
}

/// Rows without a platform are skipped: the platform is part of an OTT
/// release's identity.
pub(super) async fn run_ott(
    ctx: &AgentContext,
    agent: &AgentConfig,
    source: &Url,
    tally: &mut Tally,
    progress: &dyn AgentProgress,
) -> Result<()> {
    let rows = fetch_rows(ctx, source, progress).await?;
    let limit = agent.max_items.max(1);
    let normalizer = Normalizer::new(agent, ctx.default_language);
    let mut dedup = Deduplicator::new();
    let writer = Writer::new(&ctx.storage, agent);

    for row in rows {
        if tally.created >= limit {
            break;
        }
        let Some(platform) = row.platform.as_deref().map(str::trim).filter(|p| !p.is_empty())
        else {
            debug!(movie = %row.movie_name, "ott row without platform");
            tally.skipped += 1;
            continue;
        };

        let tags = normalizer.normalize(row.language_hint.as_deref(), &[row.movie_name.as_str()]);
        let language = tags.language.map(|l| l.as_str()).unwrap_or_default();
        let key = identity_key(&row.movie_name, &[language, platform]);

        match dedup
            .accept(&ctx.storage, Collection::OttReleases, &key, None)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tally.duplicates += 1;
                continue;
            }
            Err(e) => {
                tally.error(&row.movie_name, &e);
                continue;
            }
        }

        match writer.write_ott_release(&row, platform, key, &tags).await {
            Ok(record) => {
                tally.created += 1;
                progress.created(&record.movie_name, tally.created);
            }
            Err(e) => tally.error(&row.movie_name, &e),
        }
    }
    Ok(())
}
