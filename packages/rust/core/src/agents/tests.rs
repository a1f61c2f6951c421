use chrono::{NaiveDate, Utc};
use tadka_shared::{
    AgentConfig, AgentKind, ContentStatus, ContentType, Gallery, GalleryImage, Language,
    RecordId, TadkaError, YouTubeChannel,
};
use tadka_storage::ArticleFilter;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::test_support::test_context;

fn fixture(name: &str) -> String {
    let path = format!("../../../fixtures/{name}");
    std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
}

async fn serve_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

async fn serve_review_site(server: &MockServer) {
    serve_html(server, "/telugu/reviews/", fixture("html/review_listing.html")).await;
    serve_html(
        server,
        "/telugu/devara-part-1-review",
        fixture("html/review_jsonld.html"),
    )
    .await;
    serve_html(
        server,
        "/telugu/lucky-baskhar-review",
        fixture("html/review_meta.html"),
    )
    .await;
}

fn agent_for(kind: AgentKind, source: Option<String>) -> AgentConfig {
    let mut agent = AgentConfig::new(format!("{kind}-test"), kind);
    agent.source_url = source;
    agent
}

// ---------------------------------------------------------------------------
// Review agents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn review_listing_creates_articles_once() {
    let server = MockServer::start().await;
    serve_review_site(&server).await;
    let (ctx, _dir) = test_context(&server.uri()).await;

    let agent = agent_for(
        AgentKind::MovieReview,
        Some(format!("{}/telugu/reviews/", server.uri())),
    );
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 2, "errors: {:?}", report.errors);
    assert!(report.errors.is_empty());

    let articles = ctx
        .storage
        .list_articles(&ArticleFilter::default())
        .await
        .unwrap();
    assert_eq!(articles.len(), 2);
    let devara = articles
        .iter()
        .find(|a| a.slug == "devara-part-1-review")
        .expect("devara article");
    assert_eq!(devara.category, "movie-reviews");
    assert_eq!(devara.language, Some(Language::Telugu));
    assert!(devara.states.contains(&"ap".to_string()));
    assert_eq!(devara.status, ContentStatus::Draft);
    assert_eq!(devara.dedup_key, "devara-part-1:telugu");
    assert_eq!(devara.agent_id.as_deref(), Some(agent.id.as_str()));

    let amaran = articles
        .iter()
        .find(|a| a.slug == "amaran-review")
        .expect("amaran article");
    assert_eq!(amaran.language, Some(Language::Tamil));
    assert_eq!(amaran.review.as_ref().unwrap().rating, Some(3.5));

    // Second run finds nothing new
    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.duplicates, 2);

    let runs = ctx.storage.list_agent_runs(&agent.id, 10).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.finished_at.is_some()));
    let stored = ctx.storage.get_agent(&agent.id).await.unwrap().unwrap();
    assert!(stored.last_run_at.is_some());
}

#[tokio::test]
async fn review_run_respects_max_items() {
    let server = MockServer::start().await;
    serve_review_site(&server).await;
    let (ctx, _dir) = test_context(&server.uri()).await;

    let mut agent = agent_for(
        AgentKind::MovieReview,
        Some(format!("{}/telugu/reviews/", server.uri())),
    );
    agent.max_items = 1;
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 1);
}

#[tokio::test]
async fn listing_follows_at_most_max_items_links() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/reviews/",
        r#"<html><body><main>
            <a href="/reviews/first-review">First</a>
            <a href="/reviews/second-review">Second</a>
        </main></body></html>"#
            .to_string(),
    )
    .await;
    serve_html(
        &server,
        "/reviews/first-review",
        "<html><head><title>Coming soon</title></head><body></body></html>".to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/reviews/second-review"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(fixture("html/review_jsonld.html")),
        )
        .expect(0)
        .mount(&server)
        .await;
    let (ctx, _dir) = test_context(&server.uri()).await;

    let mut agent = agent_for(
        AgentKind::MovieReview,
        Some(format!("{}/reviews/", server.uri())),
    );
    agent.max_items = 1;
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.skipped, 1);
    server.verify().await;
}

#[tokio::test]
async fn single_review_page_is_used_directly() {
    let server = MockServer::start().await;
    serve_review_site(&server).await;
    let (ctx, _dir) = test_context(&server.uri()).await;

    let mut agent = agent_for(
        AgentKind::OttReview,
        Some(format!("{}/telugu/devara-part-1-review", server.uri())),
    );
    agent.auto_publish = true;
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 1);

    let articles = ctx
        .storage
        .list_articles(&ArticleFilter {
            category: Some("ott-reviews".into()),
            ..ArticleFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].status, ContentStatus::Published);
    assert!(articles[0].published_at.is_some());
}

#[tokio::test]
async fn failed_pages_are_counted_not_fatal() {
    let server = MockServer::start().await;
    serve_html(&server, "/telugu/reviews/", fixture("html/review_listing.html")).await;
    serve_html(
        &server,
        "/telugu/devara-part-1-review",
        fixture("html/review_jsonld.html"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/telugu/lucky-baskhar-review"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (ctx, _dir) = test_context(&server.uri()).await;

    let agent = agent_for(
        AgentKind::MovieReview,
        Some(format!("{}/telugu/reviews/", server.uri())),
    );
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("lucky-baskhar-review"));

    let runs = ctx.storage.list_agent_runs(&agent.id, 10).await.unwrap();
    let stats = runs[0].stats.as_ref().expect("run stats");
    assert_eq!(stats["created"], 1);
    assert_eq!(stats["errors"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn unreachable_source_is_recorded() {
    let server = MockServer::start().await;
    let (ctx, _dir) = test_context(&server.uri()).await;

    let agent = agent_for(
        AgentKind::TheaterRelease,
        Some(format!("{}/releases", server.uri())),
    );
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(ctx.storage.list_agent_runs(&agent.id, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_source_url_is_rejected_before_running() {
    let (ctx, _dir) = test_context("http://127.0.0.1:9").await;
    let agent = agent_for(AgentKind::TadkaPics, None);
    ctx.storage.insert_agent(&agent).await.unwrap();

    let err = run_agent(&ctx, &agent, &SilentProgress).await.unwrap_err();
    assert!(matches!(err, TadkaError::Validation { .. }));
    assert!(ctx.storage.list_agent_runs(&agent.id, 10).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Release agents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn theater_calendar_creates_releases() {
    let server = MockServer::start().await;
    serve_html(&server, "/releases", fixture("html/theater_releases.html")).await;
    let (ctx, _dir) = test_context(&server.uri()).await;

    let agent = agent_for(
        AgentKind::TheaterRelease,
        Some(format!("{}/releases", server.uri())),
    );
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 3, "errors: {:?}", report.errors);

    let from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let releases = ctx.storage.list_theater_releases(from, 50).await.unwrap();
    let kanguva = releases
        .iter()
        .find(|r| r.movie_name == "Kanguva")
        .expect("kanguva");
    assert_eq!(kanguva.language, Some(Language::Tamil));
    assert!(kanguva.states.contains(&"tn".to_string()));
    assert_eq!(kanguva.dedup_key, "kanguva:tamil");
    assert_eq!(kanguva.director.as_deref(), Some("Siva"));

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.duplicates, 3);
}

#[tokio::test]
async fn ott_calendar_creates_releases() {
    let server = MockServer::start().await;
    serve_html(&server, "/ott", fixture("html/ott_releases.html")).await;
    let (ctx, _dir) = test_context(&server.uri()).await;

    let agent = agent_for(AgentKind::OttRelease, Some(format!("{}/ott", server.uri())));
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 2, "errors: {:?}", report.errors);

    let from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let releases = ctx.storage.list_ott_releases(from, 50).await.unwrap();
    let citadel = releases
        .iter()
        .find(|r| r.platform == "Prime Video")
        .expect("citadel");
    assert_eq!(citadel.content_type, ContentType::Series);
    assert_eq!(citadel.language, Some(Language::Hindi));
    let lucky = releases
        .iter()
        .find(|r| r.platform == "Netflix")
        .expect("lucky baskhar");
    assert_eq!(lucky.content_type, ContentType::Movie);
    assert_eq!(lucky.dedup_key, "lucky-baskhar:telugu:netflix");
}

// ---------------------------------------------------------------------------
// Video agent
// ---------------------------------------------------------------------------

async fn serve_feed(server: &MockServer, channel_id: &str) {
    Mock::given(method("GET"))
        .and(path("/feeds/videos.xml"))
        .and(query_param("channel_id", channel_id))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/atom+xml")
                .set_body_string(fixture("feeds/youtube_channel.xml")),
        )
        .mount(server)
        .await;
}

fn channel(channel_id: &str, language: Language) -> YouTubeChannel {
    YouTubeChannel {
        id: RecordId::new().to_string(),
        name: "Studio Official".into(),
        channel_id: channel_id.into(),
        language: Some(language),
        category: "trailers".into(),
        active: true,
    }
}

#[tokio::test]
async fn video_agent_filters_by_keyword() {
    let server = MockServer::start().await;
    serve_feed(&server, "UCtelugu").await;
    let (ctx, _dir) = test_context(&format!("{}/feeds/videos.xml", server.uri())).await;
    ctx.storage
        .upsert_channel(&channel("UCtelugu", Language::Telugu))
        .await
        .unwrap();

    let mut agent = agent_for(AgentKind::Video, None);
    agent.keywords = vec!["trailer".into(), "teaser".into()];
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 2, "errors: {:?}", report.errors);
    assert_eq!(report.skipped, 1);

    let videos = ctx.storage.list_videos(Some("UCtelugu"), 10).await.unwrap();
    assert_eq!(videos.len(), 2);
    assert!(videos.iter().all(|v| v.category == "trailers"));
    assert!(videos.iter().all(|v| v.language == Some(Language::Telugu)));
    assert!(videos.iter().any(|v| v.video_id == "aaaaaaaaaa1"));

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.duplicates, 2);
}

#[tokio::test]
async fn video_agent_skips_other_language_channels() {
    let server = MockServer::start().await;
    serve_feed(&server, "UCtelugu").await;
    let (ctx, _dir) = test_context(&format!("{}/feeds/videos.xml", server.uri())).await;
    ctx.storage
        .upsert_channel(&channel("UCtelugu", Language::Telugu))
        .await
        .unwrap();

    let mut agent = agent_for(AgentKind::Video, None);
    agent.language = Some(Language::Tamil);
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 0);
    assert!(report.errors.is_empty());
}

// ---------------------------------------------------------------------------
// Tadka Pics agent
// ---------------------------------------------------------------------------

const GALLERY_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Sreeleela Latest Photos | Tadka Pics</title>
  <meta property="og:title" content="Sreeleela Latest Photos">
</head>
<body>
  <article>
    <figure><img src="/media/01.jpg" alt="1"></figure>
    <figure><img src="/media/02" alt="2"></figure>
    <figure><img src="/media/missing.jpg" alt="3"></figure>
  </article>
</body>
</html>"#;

#[tokio::test]
async fn gallery_images_continue_numbering() {
    let server = MockServer::start().await;
    serve_html(&server, "/gallery/sreeleela", GALLERY_PAGE.to_string()).await;
    Mock::given(method("GET"))
        .and(path("/media/01.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"jpeg-bytes".to_vec()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/02"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(b"png-bytes".to_vec()),
        )
        .mount(&server)
        .await;
    let (ctx, _dir) = test_context(&server.uri()).await;

    // An older upload already on disk
    ctx.media.save("sreeleela-3.jpg", b"old").unwrap();

    let source = format!("{}/gallery/sreeleela", server.uri());
    let agent = agent_for(AgentKind::TadkaPics, Some(source.clone()));
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.errors.len(), 1, "missing image is an item error");

    let galleries = ctx.storage.list_galleries(10).await.unwrap();
    assert_eq!(galleries.len(), 1);
    let gallery = ctx
        .storage
        .get_gallery(&galleries[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(gallery.entity_slug, "sreeleela");
    assert_eq!(gallery.source_url, source);
    let names: Vec<&str> = gallery.images.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["sreeleela-4.jpg", "sreeleela-5.png"]);
    assert_eq!(
        std::fs::read(ctx.media.path_for("sreeleela-5.png")).unwrap(),
        b"png-bytes"
    );
    assert_eq!(
        std::fs::read(ctx.media.path_for("sreeleela-3.jpg")).unwrap(),
        b"old"
    );

    // Same source again is a duplicate
    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.duplicates, 1);
    assert_eq!(ctx.media.list_numbers("sreeleela").unwrap(), vec![3, 4, 5]);
}

async fn serve_image(server: &MockServer, route: &str, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", content_type)
                .set_body_bytes(b"image-bytes".to_vec()),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn recorded_numbers_are_not_reused_after_file_loss() {
    let server = MockServer::start().await;
    serve_html(&server, "/gallery/sreeleela", GALLERY_PAGE.to_string()).await;
    serve_image(&server, "/media/01.jpg", "image/jpeg").await;
    let (ctx, _dir) = test_context(&server.uri()).await;

    // An older gallery whose file was removed from disk
    let older = Gallery {
        id: RecordId::new().to_string(),
        title: "Sreeleela Saree Photos".into(),
        slug: "sreeleela-saree-photos".into(),
        entity_name: "Sreeleela".into(),
        entity_slug: "sreeleela".into(),
        images: vec![GalleryImage {
            number: 7,
            file_name: "sreeleela-7.jpg".into(),
            source_url: "https://cdn.example.com/7.jpg".into(),
        }],
        language: None,
        states: vec!["all".into()],
        source_url: "https://www.instagram.com/p/OLDPOST/".into(),
        status: ContentStatus::Published,
        agent_id: None,
        created_at: Utc::now(),
    };
    ctx.storage.insert_gallery(&older).await.unwrap();
    assert!(ctx.media.list_numbers("sreeleela").unwrap().is_empty());

    let agent = agent_for(
        AgentKind::TadkaPics,
        Some(format!("{}/gallery/sreeleela", server.uri())),
    );
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 1, "errors: {:?}", report.errors);
    assert_eq!(ctx.media.list_numbers("sreeleela").unwrap(), vec![8]);
    assert_eq!(
        ctx.storage.gallery_image_numbers("sreeleela").await.unwrap(),
        vec![7, 8]
    );
}

#[tokio::test]
async fn instagram_post_without_images_uses_embed_page() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/p/C9xYz_12-Ab/",
        r#"<html><head><title>Samantha on Instagram: "Sunday light"</title></head>
        <body><div id="react-root"></div></body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/p/C9xYz_12-Ab/embed/captioned/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(
                    r#"<html><body><article><img src="/cdn/448_n.jpg"></article></body></html>"#,
                ),
        )
        .expect(1)
        .mount(&server)
        .await;
    serve_image(&server, "/cdn/448_n.jpg", "image/jpeg").await;
    let (mut ctx, _dir) = test_context(&server.uri()).await;
    ctx.instagram_base = server.uri();

    let agent = agent_for(
        AgentKind::TadkaPics,
        Some("https://www.instagram.com/p/C9xYz_12-Ab/?igsh=abc".into()),
    );
    ctx.storage.insert_agent(&agent).await.unwrap();

    let report = run_agent(&ctx, &agent, &SilentProgress).await.unwrap();
    assert_eq!(report.created, 1, "errors: {:?}", report.errors);

    let galleries = ctx.storage.list_galleries(10).await.unwrap();
    let gallery = ctx
        .storage
        .get_gallery(&galleries[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(gallery.source_url, "https://www.instagram.com/p/C9xYz_12-Ab/");
    assert_eq!(gallery.entity_slug, "samantha");
    let names: Vec<&str> = gallery.images.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["samantha-1.jpg"]);
    server.verify().await;
}
