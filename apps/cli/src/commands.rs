//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use tadka_core::gallery_admin;
use tadka_core::media::MediaStore;
use tadka_core::{AgentContext, AgentProgress, AgentRunReport, Scheduler, SilentProgress};
use tadka_shared::regions::{self, STATES};
use tadka_shared::{
    AgentConfig, AgentKind, AppConfig, ContentStatus, Language, expand_home, init_config,
    load_config,
};
use tadka_storage::{ArticleFilter, Storage};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Tadka: content agents for the Tadka CMS.
#[derive(Parser)]
#[command(
    name = "tadka",
    version,
    about = "Scrape reviews, release calendars, videos and photo galleries into the Tadka CMS.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Database file (overrides `defaults.database_path`).
    #[arg(long, env = "TADKA_DB", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Manage and run agents.
    Agent {
        #[command(subcommand)]
        action: AgentAction,
    },

    /// Manage the YouTube channels the video agent reads.
    Channel {
        #[command(subcommand)]
        action: ChannelAction,
    },

    /// Inspect and publish articles.
    Article {
        #[command(subcommand)]
        action: ArticleAction,
    },

    /// Inspect release calendars.
    Release {
        #[command(subcommand)]
        action: ReleaseAction,
    },

    /// Manage photo galleries.
    Gallery {
        #[command(subcommand)]
        action: GalleryAction,
    },

    /// Show the state → language table.
    States {
        /// Only states where this language is regional.
        #[arg(long)]
        language: Option<Language>,
    },

    /// Run due agents on a timer until interrupted.
    Schedule,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Agent subcommands.
#[derive(Subcommand)]
pub(crate) enum AgentAction {
    /// List registered agents.
    List,
    /// Register an agent, or every `[[agents]]` entry with `--from-config`.
    Add {
        /// Unique agent name.
        #[arg(long, required_unless_present = "from_config")]
        name: Option<String>,

        /// movie-review, ott-review, theater-release, ott-release, video, or tadka-pics.
        #[arg(long, required_unless_present = "from_config")]
        kind: Option<AgentKind>,

        /// Page the agent starts from.
        #[arg(long)]
        source_url: Option<String>,

        /// Force the language of everything the agent writes.
        #[arg(long)]
        language: Option<Language>,

        /// Force state codes (comma-separated).
        #[arg(long, value_delimiter = ',')]
        states: Vec<String>,

        /// Title keywords for the video agent (comma-separated).
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,

        /// Maximum records per run.
        #[arg(long, default_value = "10")]
        max_items: u32,

        /// Minutes between scheduled runs (0 = manual only).
        #[arg(long, default_value = "0")]
        schedule_minutes: u32,

        /// Publish records immediately instead of saving drafts.
        #[arg(long)]
        auto_publish: bool,

        /// Register the agents listed in the config file instead.
        #[arg(long, conflicts_with_all = ["name", "kind"])]
        from_config: bool,
    },
    /// Run an agent now.
    Run {
        /// Agent ID or name.
        agent: String,
    },
    /// Allow the scheduler to run an agent.
    Enable {
        /// Agent ID or name.
        agent: String,
    },
    /// Stop the scheduler from running an agent.
    Disable {
        /// Agent ID or name.
        agent: String,
    },
    /// Delete an agent and its run history. Content it wrote is kept.
    Remove {
        /// Agent ID or name.
        agent: String,
    },
    /// Show recent runs of an agent.
    Runs {
        /// Agent ID or name.
        agent: String,

        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

/// Channel subcommands.
#[derive(Subcommand)]
pub(crate) enum ChannelAction {
    /// Register a channel, or every `[[channels]]` entry with `--from-config`.
    Add {
        /// Display name.
        #[arg(long, required_unless_present = "from_config")]
        name: Option<String>,

        /// YouTube channel id (`UC...`).
        #[arg(long, required_unless_present = "from_config")]
        channel_id: Option<String>,

        #[arg(long)]
        language: Option<Language>,

        /// CMS section for the channel's videos.
        #[arg(long, default_value = "trailers")]
        category: String,

        /// Register the channels listed in the config file instead.
        #[arg(long, conflicts_with_all = ["name", "channel_id"])]
        from_config: bool,
    },
    /// List registered channels.
    List,
}

/// Article subcommands.
#[derive(Subcommand)]
pub(crate) enum ArticleAction {
    /// List articles, newest first.
    List {
        /// draft or published.
        #[arg(long)]
        status: Option<ContentStatus>,

        /// movie-reviews or ott-reviews.
        #[arg(long)]
        category: Option<String>,

        #[arg(long, default_value = "50")]
        limit: u32,
    },
    /// Publish a draft article.
    Publish {
        /// Article ID.
        id: String,
    },
    /// Delete an article.
    Delete {
        /// Article ID.
        id: String,
    },
    /// Full-text search over titles and summaries.
    Search {
        query: String,

        #[arg(long, default_value = "20")]
        limit: u32,
    },
}

/// Release subcommands.
#[derive(Subcommand)]
pub(crate) enum ReleaseAction {
    /// Releases from a date onward (today by default).
    Upcoming {
        /// Show OTT releases instead of theatrical ones.
        #[arg(long)]
        ott: bool,

        /// First date to show (YYYY-MM-DD).
        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long, default_value = "50")]
        limit: u32,
    },
}

/// Gallery subcommands.
#[derive(Subcommand)]
pub(crate) enum GalleryAction {
    /// List galleries, newest first.
    List {
        #[arg(long, default_value = "50")]
        limit: u32,
    },
    /// Delete a gallery and its image files.
    Delete {
        /// Gallery ID.
        id: String,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tadka=info",
        1 => "tadka=debug",
        _ => "tadka=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config()?;
    if let Some(db) = &cli.db {
        config.defaults.database_path = db.to_string_lossy().into_owned();
    }

    match cli.command {
        Command::Agent { action } => match action {
            AgentAction::List => cmd_agent_list(&config).await,
            AgentAction::Add {
                name,
                kind,
                source_url,
                language,
                states,
                keywords,
                max_items,
                schedule_minutes,
                auto_publish,
                from_config,
            } => {
                if from_config {
                    cmd_agent_add_from_config(&config).await
                } else {
                    let name = name.ok_or_else(|| eyre!("--name is required"))?;
                    let kind = kind.ok_or_else(|| eyre!("--kind is required"))?;
                    let mut agent = AgentConfig::new(name, kind);
                    agent.source_url = source_url;
                    agent.language = language;
                    agent.states = regions::validate_states(&states)?;
                    agent.keywords = keywords;
                    agent.max_items = max_items;
                    agent.schedule_minutes = schedule_minutes;
                    agent.auto_publish = auto_publish;
                    cmd_agent_add(&config, agent).await
                }
            }
            AgentAction::Run { agent } => cmd_agent_run(&config, &agent).await,
            AgentAction::Enable { agent } => cmd_agent_enable(&config, &agent, true).await,
            AgentAction::Disable { agent } => cmd_agent_enable(&config, &agent, false).await,
            AgentAction::Remove { agent } => cmd_agent_remove(&config, &agent).await,
            AgentAction::Runs { agent, limit } => cmd_agent_runs(&config, &agent, limit).await,
        },
        Command::Channel { action } => match action {
            ChannelAction::Add {
                name,
                channel_id,
                language,
                category,
                from_config,
            } => cmd_channel_add(&config, name, channel_id, language, category, from_config).await,
            ChannelAction::List => cmd_channel_list(&config).await,
        },
        Command::Article { action } => match action {
            ArticleAction::List {
                status,
                category,
                limit,
            } => {
                let filter = ArticleFilter {
                    status,
                    category,
                    limit,
                };
                cmd_article_list(&config, &filter).await
            }
            ArticleAction::Publish { id } => cmd_article_publish(&config, &id).await,
            ArticleAction::Delete { id } => cmd_article_delete(&config, &id).await,
            ArticleAction::Search { query, limit } => {
                cmd_article_search(&config, &query, limit).await
            }
        },
        Command::Release { action } => match action {
            ReleaseAction::Upcoming { ott, from, limit } => {
                let from = from.unwrap_or_else(|| Utc::now().date_naive());
                cmd_release_upcoming(&config, ott, from, limit).await
            }
        },
        Command::Gallery { action } => match action {
            GalleryAction::List { limit } => cmd_gallery_list(&config, limit).await,
            GalleryAction::Delete { id } => cmd_gallery_delete(&config, &id).await,
        },
        Command::States { language } => cmd_states(language),
        Command::Schedule => cmd_schedule(&config).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

async fn open_storage(config: &AppConfig) -> Result<Storage> {
    let path = expand_home(&config.defaults.database_path)?;
    Ok(Storage::open(&path).await?)
}

async fn require_agent(storage: &Storage, id_or_name: &str) -> Result<AgentConfig> {
    storage
        .find_agent(id_or_name)
        .await?
        .ok_or_else(|| eyre!("no agent named or with id '{id_or_name}'"))
}

// ---------------------------------------------------------------------------
// Agent commands
// ---------------------------------------------------------------------------

async fn cmd_agent_list(config: &AppConfig) -> Result<()> {
    let storage = open_storage(config).await?;
    let agents = storage.list_agents().await?;
    if agents.is_empty() {
        println!("No agents registered. Add one with `tadka agent add`.");
        return Ok(());
    }

    println!(
        "  {:<24} {:<16} {:<8} {:<10} {:<20}",
        "NAME", "KIND", "ENABLED", "EVERY", "LAST RUN"
    );
    for agent in agents {
        let every = match agent.schedule_minutes {
            0 => "manual".to_string(),
            m => format!("{m}m"),
        };
        let last_run = agent
            .last_run_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".into());
        println!(
            "  {:<24} {:<16} {:<8} {:<10} {:<20}",
            agent.name,
            agent.kind.as_str(),
            if agent.enabled { "yes" } else { "no" },
            every,
            last_run
        );
    }
    Ok(())
}

async fn cmd_agent_add(config: &AppConfig, agent: AgentConfig) -> Result<()> {
    if agent.kind.requires_source_url() {
        let raw = agent
            .source_url
            .as_deref()
            .ok_or_else(|| eyre!("{} agents need --source-url", agent.kind))?;
        Url::parse(raw).map_err(|e| eyre!("invalid source URL '{raw}': {e}"))?;
    }

    let storage = open_storage(config).await?;
    if storage.get_agent_by_name(&agent.name).await?.is_some() {
        return Err(eyre!("an agent named '{}' already exists", agent.name));
    }
    storage.insert_agent(&agent).await?;
    info!(name = %agent.name, kind = %agent.kind, "agent added");
    println!("Added agent '{}' ({})", agent.name, agent.id);
    Ok(())
}

async fn cmd_agent_add_from_config(config: &AppConfig) -> Result<()> {
    if config.agents.is_empty() {
        println!("No [[agents]] entries in the config file.");
        return Ok(());
    }

    let storage = open_storage(config).await?;
    let mut added = 0;
    for seed in &config.agents {
        if storage.get_agent_by_name(&seed.name).await?.is_some() {
            println!("  skip  {} (already registered)", seed.name);
            continue;
        }
        let agent = seed.to_agent()?;
        storage.insert_agent(&agent).await?;
        println!("  added {} ({})", agent.name, agent.kind);
        added += 1;
    }
    println!("Added {added} agent(s).");
    Ok(())
}

async fn cmd_agent_run(config: &AppConfig, id_or_name: &str) -> Result<()> {
    let ctx = AgentContext::from_config(config).await?;
    let agent = require_agent(&ctx.storage, id_or_name).await?;

    let reporter = CliProgress::new();
    let report = tadka_core::run_agent(&ctx, &agent, &reporter).await?;
    print_report(&report);
    Ok(())
}

async fn cmd_agent_enable(config: &AppConfig, id_or_name: &str, enabled: bool) -> Result<()> {
    let storage = open_storage(config).await?;
    let agent = require_agent(&storage, id_or_name).await?;
    storage.set_agent_enabled(&agent.id, enabled).await?;
    let state = if enabled { "enabled" } else { "disabled" };
    println!("Agent '{}' {state}.", agent.name);
    Ok(())
}

async fn cmd_agent_remove(config: &AppConfig, id_or_name: &str) -> Result<()> {
    let storage = open_storage(config).await?;
    let agent = require_agent(&storage, id_or_name).await?;
    storage.delete_agent(&agent.id).await?;
    println!("Removed agent '{}'. Content it created was kept.", agent.name);
    Ok(())
}

async fn cmd_agent_runs(config: &AppConfig, id_or_name: &str, limit: u32) -> Result<()> {
    let storage = open_storage(config).await?;
    let agent = require_agent(&storage, id_or_name).await?;
    let runs = storage.list_agent_runs(&agent.id, limit).await?;
    if runs.is_empty() {
        println!("Agent '{}' has not run yet.", agent.name);
        return Ok(());
    }

    for run in runs {
        let stats = run.stats.unwrap_or_default();
        let count = |key: &str| stats.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
        let errors = stats
            .get("errors")
            .and_then(|v| v.as_array())
            .map_or(0, Vec::len);
        let finished = if run.finished_at.is_some() { "" } else { " (unfinished)" };
        println!(
            "  {}  created {:<3} duplicates {:<3} skipped {:<3} errors {}{finished}",
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            count("created"),
            count("duplicates"),
            count("skipped"),
            errors,
        );
    }
    Ok(())
}

fn print_report(report: &AgentRunReport) {
    println!();
    println!("  Agent run finished: {}", report.agent_name);
    println!("  Created:    {}", report.created);
    println!("  Duplicates: {}", report.duplicates);
    println!("  Skipped:    {}", report.skipped);
    println!("  Errors:     {}", report.errors.len());
    for error in &report.errors {
        println!("    - {error}");
    }
    println!("  Time:       {:.1}s", report.duration.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// Channel commands
// ---------------------------------------------------------------------------

async fn cmd_channel_add(
    config: &AppConfig,
    name: Option<String>,
    channel_id: Option<String>,
    language: Option<Language>,
    category: String,
    from_config: bool,
) -> Result<()> {
    let storage = open_storage(config).await?;

    let channels = if from_config {
        config
            .channels
            .iter()
            .map(|seed| seed.to_channel())
            .collect::<tadka_shared::Result<Vec<_>>>()?
    } else {
        let seed = tadka_shared::ChannelSeed {
            name: name.ok_or_else(|| eyre!("--name is required"))?,
            channel_id: channel_id.ok_or_else(|| eyre!("--channel-id is required"))?,
            language,
            category,
        };
        vec![seed.to_channel()?]
    };

    for channel in &channels {
        storage.upsert_channel(channel).await?;
        println!("  saved {} ({})", channel.name, channel.channel_id);
    }
    Ok(())
}

async fn cmd_channel_list(config: &AppConfig) -> Result<()> {
    let storage = open_storage(config).await?;
    let channels = storage.list_channels(false).await?;
    if channels.is_empty() {
        println!("No channels registered.");
        return Ok(());
    }
    for channel in channels {
        println!(
            "  {:<28} {:<26} {:<10} {:<10} {}",
            channel.name,
            channel.channel_id,
            channel.language.map_or("-", |l| l.as_str()),
            channel.category,
            if channel.active { "active" } else { "inactive" },
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Article commands
// ---------------------------------------------------------------------------

async fn cmd_article_list(config: &AppConfig, filter: &ArticleFilter) -> Result<()> {
    let storage = open_storage(config).await?;
    let articles = storage.list_articles(filter).await?;
    if articles.is_empty() {
        println!("No articles.");
        return Ok(());
    }
    for article in articles {
        let rating = article
            .review
            .as_ref()
            .and_then(|r| r.rating)
            .map_or_else(|| "-".to_string(), |r| format!("{r:.2}/5"));
        println!(
            "  {}  {:<9} {:<13} {:<7} {:<10} {}",
            article.id,
            article.status.as_str(),
            article.category,
            rating,
            article.language.map_or("-", |l| l.as_str()),
            article.title,
        );
    }
    Ok(())
}

async fn cmd_article_publish(config: &AppConfig, id: &str) -> Result<()> {
    let storage = open_storage(config).await?;
    if !storage.set_article_status(id, ContentStatus::Published).await? {
        return Err(eyre!("no article with id '{id}'"));
    }
    println!("Published {id}.");
    Ok(())
}

async fn cmd_article_delete(config: &AppConfig, id: &str) -> Result<()> {
    let storage = open_storage(config).await?;
    if !storage.delete_article(id).await? {
        return Err(eyre!("no article with id '{id}'"));
    }
    println!("Deleted article {id}.");
    Ok(())
}

async fn cmd_article_search(config: &AppConfig, query: &str, limit: u32) -> Result<()> {
    let storage = open_storage(config).await?;
    let results = storage.search_articles(query, limit).await?;
    if results.is_empty() {
        println!("No matches for '{query}'.");
        return Ok(());
    }
    for result in results {
        println!("  {}  {:<40} {}", result.id, result.slug, result.title);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Release and gallery commands
// ---------------------------------------------------------------------------

async fn cmd_release_upcoming(
    config: &AppConfig,
    ott: bool,
    from: NaiveDate,
    limit: u32,
) -> Result<()> {
    let storage = open_storage(config).await?;
    if ott {
        let releases = storage.list_ott_releases(from, limit).await?;
        if releases.is_empty() {
            println!("No OTT releases from {from}.");
        }
        for r in releases {
            println!(
                "  {}  {:<32} {:<14} {:<7} {}",
                r.release_date,
                r.movie_name,
                r.platform,
                r.content_type.as_str(),
                r.language.map_or("-", |l| l.as_str()),
            );
        }
    } else {
        let releases = storage.list_theater_releases(from, limit).await?;
        if releases.is_empty() {
            println!("No theater releases from {from}.");
        }
        for r in releases {
            println!(
                "  {}  {:<32} {:<10} {}",
                r.release_date,
                r.movie_name,
                r.language.map_or("-", |l| l.as_str()),
                r.states.join(","),
            );
        }
    }
    Ok(())
}

async fn cmd_gallery_list(config: &AppConfig, limit: u32) -> Result<()> {
    let storage = open_storage(config).await?;
    for gallery in storage.list_galleries(limit).await? {
        println!(
            "  {}  {:<9} {:<20} {}",
            gallery.id,
            gallery.status.as_str(),
            gallery.entity_slug,
            gallery.title,
        );
    }
    Ok(())
}

async fn cmd_gallery_delete(config: &AppConfig, id: &str) -> Result<()> {
    let storage = open_storage(config).await?;
    let media = MediaStore::open(expand_home(&config.defaults.media_dir)?)?;
    let outcome = gallery_admin::delete_gallery(&storage, &media, id).await?;
    if !outcome.deleted {
        return Err(eyre!("no gallery with id '{id}'"));
    }
    println!(
        "Deleted gallery {id} ({} file(s) removed, {} failed).",
        outcome.files_removed, outcome.files_failed
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// States, scheduler, config
// ---------------------------------------------------------------------------

fn cmd_states(language: Option<Language>) -> Result<()> {
    let codes = language.map(regions::states_for_language);
    for state in STATES {
        if codes.as_ref().is_some_and(|c| !c.contains(&state.code)) {
            continue;
        }
        let languages: Vec<&str> = state.languages.iter().map(|l| l.as_str()).collect();
        println!("  {:<3} {:<20} {}", state.code, state.name, languages.join(", "));
    }
    Ok(())
}

async fn cmd_schedule(config: &AppConfig) -> Result<()> {
    let ctx = AgentContext::from_config(config).await?;
    let scheduler = Scheduler::new(&ctx, config.scheduler.clone());
    println!(
        "Scheduler running every {}s. Press Ctrl-C to stop.",
        config.scheduler.tick_secs
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    scheduler.run_until(shutdown, &SilentProgress).await?;
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl AgentProgress for CliProgress {
    fn agent_started(&self, agent: &AgentConfig) {
        self.spinner
            .set_message(format!("Running {} ({})", agent.name, agent.kind));
    }

    fn fetching(&self, url: &str) {
        self.spinner.set_message(format!("Fetching {url}"));
    }

    fn created(&self, title: &str, count: u32) {
        self.spinner.println(format!("  + [{count}] {title}"));
    }

    fn agent_finished(&self, _report: &AgentRunReport) {
        self.spinner.finish_and_clear();
    }
}
