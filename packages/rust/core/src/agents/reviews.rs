//! Movie and OTT review agents: review pages → articles.

use scraper::Html;
use tracing::debug;
use url::Url;

use tadka_shared::{AgentConfig, Result};
use tadka_sources::{ParserRegistry, ScrapedReview, extract_review_links};

use super::{AgentContext, AgentProgress, Tally};
use crate::dedup::{Collection, Deduplicator, identity_key};
use crate::normalize::Normalizer;
use crate::writer::{OTT_REVIEWS, Writer};

enum SourcePage {
    Review(Box<ScrapedReview>),
    Listing(Vec<Url>),
}

fn read_source_page(parsers: &ParserRegistry, body: &str, url: &Url) -> SourcePage {
    let doc = Html::parse_document(body);
    if parsers.detect(&doc).is_some() {
        if let Some(review) = parsers.extract(&doc, url) {
            return SourcePage::Review(Box::new(review));
        }
    }
    SourcePage::Listing(extract_review_links(&doc, url))
}

fn parse_review(parsers: &ParserRegistry, body: &str, url: &Url) -> Option<ScrapedReview> {
    let doc = Html::parse_document(body);
    parsers.extract(&doc, url)
}

struct ReviewRun<'a> {
    ctx: &'a AgentContext,
    category: &'a str,
    normalizer: Normalizer,
    dedup: Deduplicator,
    writer: Writer<'a>,
}

impl ReviewRun<'_> {
    async fn accept(
        &mut self,
        review: ScrapedReview,
        tally: &mut Tally,
        progress: &dyn AgentProgress,
    ) -> Result<()> {
        if review.movie_title.is_empty() || review.body_html.is_empty() {
            debug!(url = %review.source_url, "review without title or body");
            tally.skipped += 1;
            return Ok(());
        }

        let tags = self.normalizer.normalize(
            review.language_hint.as_deref(),
            &[review.title.as_str(), review.movie_title.as_str()],
        );
        let language = tags.language.map(|l| l.as_str()).unwrap_or_default();
        let platform = if self.category == OTT_REVIEWS {
            review.platform.as_deref().unwrap_or_default()
        } else {
            ""
        };
        let key = identity_key(&review.movie_title, &[language, platform]);

        let collection = Collection::Articles {
            category: self.category,
        };
        if !self
            .dedup
            .accept(&self.ctx.storage, collection, &key, Some(&review.source_url))
            .await?
        {
            tally.duplicates += 1;
            return Ok(());
        }

        let article = self
            .writer
            .write_review(&review, self.category, key, &tags)
            .await?;
        tally.created += 1;
        progress.created(&article.title, tally.created);
        Ok(())
    }
}

/// Use `source` directly when it is a review page, else follow at most
/// `max_items` of its review links. Links already stored are not fetched
/// and do not count.
pub(super) async fn run(
    ctx: &AgentContext,
    agent: &AgentConfig,
    source: &Url,
    category: &str,
    tally: &mut Tally,
    progress: &dyn AgentProgress,
) -> Result<()> {
    let limit = agent.max_items.max(1);
    let mut run = ReviewRun {
        ctx,
        category,
        normalizer: Normalizer::new(agent, ctx.default_language),
        dedup: Deduplicator::new(),
        writer: Writer::new(&ctx.storage, agent),
    };

    progress.fetching(source.as_str());
    let page = ctx.fetcher.fetch_page(source).await?;

    let links = match read_source_page(&ctx.parsers, &page.body, source) {
        SourcePage::Review(review) => {
            if let Err(e) = run.accept(*review, tally, progress).await {
                tally.error(source.as_str(), &e);
            }
            return Ok(());
        }
        SourcePage::Listing(links) => links,
    };
    debug!(links = links.len(), "review links found");

    let mut followed = 0;
    for link in links {
        if followed >= limit || tally.created >= limit {
            break;
        }
        match ctx.storage.article_source_exists(link.as_str()).await {
            Ok(true) => {
                tally.duplicates += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                tally.error(link.as_str(), &e);
                continue;
            }
        }

        // Every fetched link counts, whether or not it yields an article.
        followed += 1;
        progress.fetching(link.as_str());
        let page = match ctx.fetcher.fetch_page(&link).await {
            Ok(page) => page,
            Err(e) => {
                tally.error(link.as_str(), &e);
                continue;
            }
        };
        let Some(review) = parse_review(&ctx.parsers, &page.body, &link) else {
            debug!(url = %link, "no review found on page");
            tally.skipped += 1;
            continue;
        };
        if let Err(e) = run.accept(review, tally, progress).await {
            tally.error(link.as_str(), &e);
        }
    }
    Ok(())
}
