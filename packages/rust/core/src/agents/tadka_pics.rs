//! Tadka Pics agent: Instagram posts and gallery pages → numbered galleries.

use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use tadka_shared::{AgentConfig, GalleryImage, Result};
use tadka_sources::{
    ScrapedGallery, extract_gallery, instagram_embed_url, instagram_page_url, instagram_post_url,
    instagram_shortcode, slugify,
};

use super::{AgentContext, AgentProgress, Tally};
use crate::dedup::{Collection, Deduplicator};
use crate::media::{extension_from_url, next_image_number};
use crate::normalize::Normalizer;
use crate::writer::{Writer, build_gallery};

fn parse_gallery(body: &str, base: &Url) -> ScrapedGallery {
    let doc = Html::parse_document(body);
    extract_gallery(&doc, base)
}

async fn fetch_gallery(
    ctx: &AgentContext,
    url: &Url,
    progress: &dyn AgentProgress,
) -> Result<ScrapedGallery> {
    progress.fetching(url.as_str());
    let page = ctx.fetcher.fetch_page(url).await?;
    Ok(parse_gallery(&page.body, url))
}

/// Download up to `max_items` images from `source` and write one gallery.
///
/// Images are numbered after the highest number the entity already has in
/// the database or the media store. When the gallery cannot be written, the
/// downloaded files are removed again.
pub(super) async fn run(
    ctx: &AgentContext,
    agent: &AgentConfig,
    source: &Url,
    tally: &mut Tally,
    progress: &dyn AgentProgress,
) -> Result<()> {
    let shortcode = instagram_shortcode(source);
    let canonical = instagram_post_url(source).unwrap_or_else(|| source.clone());
    let mut dedup = Deduplicator::new();
    if !dedup
        .accept(
            &ctx.storage,
            Collection::Galleries,
            canonical.as_str(),
            Some(canonical.as_str()),
        )
        .await?
    {
        debug!(source = %canonical, "gallery already exists");
        tally.duplicates += 1;
        return Ok(());
    }

    let page_url = shortcode
        .as_deref()
        .and_then(|code| instagram_page_url(&ctx.instagram_base, code))
        .unwrap_or_else(|| source.clone());
    let mut scraped = fetch_gallery(ctx, &page_url, progress).await?;
    if scraped.image_urls.is_empty() {
        let embed_url = shortcode
            .as_deref()
            .and_then(|code| instagram_embed_url(&ctx.instagram_base, code));
        if let Some(embed) = embed_url {
            debug!(%embed, "no images on post page, trying embed");
            let from_embed = fetch_gallery(ctx, &embed, progress).await?;
            scraped.image_urls = from_embed.image_urls;
            if scraped.title.is_empty() {
                scraped.title = from_embed.title;
                scraped.entity_name = from_embed.entity_name;
            }
        }
    }

    let entity_slug = slugify(&scraped.entity_name);
    if scraped.image_urls.is_empty() || entity_slug.is_empty() {
        debug!(source = %canonical, "no usable images");
        tally.skipped += 1;
        return Ok(());
    }

    let mut known = ctx.storage.gallery_image_numbers(&entity_slug).await?;
    known.extend(ctx.media.list_numbers(&entity_slug)?);
    let mut number = next_image_number(known)?;

    let limit = agent.max_items.max(1) as usize;
    let mut images = Vec::new();
    for image_url in scraped.image_urls.iter().take(limit) {
        progress.fetching(image_url.as_str());
        let fetched = match ctx.fetcher.fetch_bytes(image_url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tally.error(image_url.as_str(), &e);
                continue;
            }
        };
        let ext = extension_from_url(image_url, fetched.content_type.as_deref());
        match ctx
            .media
            .save_numbered(&entity_slug, number, &ext, &fetched.bytes)
        {
            Ok((used, file_name)) => {
                images.push(GalleryImage {
                    number: used,
                    file_name,
                    source_url: image_url.to_string(),
                });
                number = used.saturating_add(1);
            }
            Err(e) => tally.error(image_url.as_str(), &e),
        }
    }

    if images.is_empty() {
        warn!(source = %canonical, "no images could be stored");
        tally.skipped += 1;
        return Ok(());
    }

    let tags = Normalizer::new(agent, ctx.default_language)
        .normalize(None, &[scraped.title.as_str(), scraped.entity_name.as_str()]);
    let gallery = build_gallery(agent, &scraped, canonical.as_str(), images, &tags);

    if let Err(e) = Writer::new(&ctx.storage, agent).write_gallery(&gallery).await {
        for image in &gallery.images {
            ctx.media.delete(&image.file_name);
        }
        return Err(e);
    }
    tally.created += 1;
    progress.created(&gallery.title, tally.created);
    Ok(())
}
