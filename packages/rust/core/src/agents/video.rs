//! Video agent: YouTube channel feeds → videos.

use tracing::debug;

use tadka_shared::{AgentConfig, Result};
use tadka_sources::{feed_url_for, matches_keywords, parse_youtube_feed};

use super::{AgentContext, AgentProgress, Tally};
use crate::dedup::{Collection, Deduplicator};
use crate::normalize::Normalizer;
use crate::writer::Writer;

/// Read every active channel (those in the agent's language when it has
/// one) and insert unseen videos whose titles match the agent's keywords.
pub(super) async fn run(
    ctx: &AgentContext,
    agent: &AgentConfig,
    tally: &mut Tally,
    progress: &dyn AgentProgress,
) -> Result<()> {
    let channels: Vec<_> = ctx
        .storage
        .list_channels(true)
        .await?
        .into_iter()
        .filter(|c| agent.language.is_none() || c.language == agent.language)
        .collect();
    debug!(channels = channels.len(), "channels to read");

    let limit = agent.max_items.max(1);
    let normalizer = Normalizer::new(agent, ctx.default_language);
    let mut dedup = Deduplicator::new();
    let writer = Writer::new(&ctx.storage, agent);

    'channels: for channel in &channels {
        if tally.created >= limit {
            break;
        }
        let feed_url = match feed_url_for(&ctx.feed_base, &channel.channel_id) {
            Ok(url) => url,
            Err(e) => {
                tally.error(&channel.name, &e);
                continue;
            }
        };

        progress.fetching(feed_url.as_str());
        let videos = match ctx.fetcher.fetch_page(&feed_url).await {
            Ok(page) => parse_youtube_feed(page.body.as_bytes()),
            Err(e) => Err(e),
        };
        let videos = match videos {
            Ok(videos) => videos,
            Err(e) => {
                tally.error(&channel.name, &e);
                continue;
            }
        };

        let hint = channel.language.map(|l| l.as_str());
        for video in videos {
            if tally.created >= limit {
                break 'channels;
            }
            if !matches_keywords(&video.title, &agent.keywords) {
                tally.skipped += 1;
                continue;
            }
            match dedup
                .accept(&ctx.storage, Collection::Videos, &video.video_id, None)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    tally.duplicates += 1;
                    continue;
                }
                Err(e) => {
                    tally.error(&video.url, &e);
                    continue;
                }
            }

            let tags = normalizer.normalize(hint, &[video.title.as_str()]);
            match writer.write_video(&video, channel, &tags).await {
                Ok(true) => {
                    tally.created += 1;
                    progress.created(&video.title, tally.created);
                }
                Ok(false) => tally.duplicates += 1,
                Err(e) => tally.error(&video.url, &e),
            }
        }
    }
    Ok(())
}
