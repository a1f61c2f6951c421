//! Application configuration for Tadka.
//!
//! User config lives at `~/.tadka/tadka.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TadkaError};
use crate::regions::{Language, validate_states};
use crate::types::{AgentConfig, AgentKind, RecordId, YouTubeChannel};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "tadka.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".tadka";

// ---------------------------------------------------------------------------
// Config structs (matching tadka.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP fetch policies.
    #[serde(default)]
    pub fetch: FetchPoliciesConfig,

    /// Scheduler loop settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Agents to register with `tadka agent add --from-config`.
    #[serde(default)]
    pub agents: Vec<AgentSeed>,

    /// YouTube channels to register with `tadka channel add --from-config`.
    #[serde(default)]
    pub channels: Vec<ChannelSeed>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Path to the CMS database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory gallery images are written to.
    #[serde(default = "default_media_dir")]
    pub media_dir: String,

    /// Language used when neither the agent nor the content gives one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language: Option<Language>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            media_dir: default_media_dir(),
            default_language: None,
        }
    }
}

fn default_database_path() -> String {
    "~/.tadka/tadka.db".into()
}
fn default_media_dir() -> String {
    "~/.tadka/media".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchPoliciesConfig {
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum ms between two requests made by the same fetcher.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,

    /// Redirects followed before giving up.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Responses larger than this are rejected.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: u64,

    /// Override for the User-Agent header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for FetchPoliciesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            rate_limit_ms: default_rate_limit(),
            max_redirects: default_max_redirects(),
            max_response_bytes: default_max_response_bytes(),
            user_agent: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_rate_limit() -> u64 {
    500
}
fn default_max_redirects() -> usize {
    5
}
fn default_max_response_bytes() -> u64 {
    15 * 1024 * 1024
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between checks for due agents.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Check for due agents immediately instead of after the first tick.
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            run_on_start: true,
        }
    }
}

fn default_tick_secs() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

/// `[[agents]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSeed {
    pub name: String,
    pub kind: AgentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default = "default_max_items")]
    pub max_items: u32,
    #[serde(default)]
    pub schedule_minutes: u32,
    #[serde(default)]
    pub auto_publish: bool,
}

fn default_max_items() -> u32 {
    10
}

impl AgentSeed {
    /// Turn a seed into a validated, enabled [`AgentConfig`].
    pub fn to_agent(&self) -> Result<AgentConfig> {
        if self.kind.requires_source_url() && self.source_url.is_none() {
            return Err(TadkaError::config(format!(
                "agent '{}' ({}) needs a source_url",
                self.name, self.kind
            )));
        }
        let mut agent = AgentConfig::new(self.name.clone(), self.kind);
        agent.source_url = self.source_url.clone();
        agent.language = self.language;
        agent.states = validate_states(&self.states)?;
        agent.keywords = self.keywords.clone();
        agent.max_items = self.max_items;
        agent.schedule_minutes = self.schedule_minutes;
        agent.auto_publish = self.auto_publish;
        Ok(agent)
    }
}

/// `[[channels]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSeed {
    pub name: String,
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default = "default_video_category")]
    pub category: String,
}

fn default_video_category() -> String {
    "trailers".into()
}

impl ChannelSeed {
    /// Turn a seed into an active [`YouTubeChannel`].
    pub fn to_channel(&self) -> Result<YouTubeChannel> {
        let channel_id = self.channel_id.trim();
        if channel_id.is_empty() {
            return Err(TadkaError::config(format!(
                "channel '{}' needs a channel_id",
                self.name
            )));
        }
        Ok(YouTubeChannel {
            id: RecordId::new().to_string(),
            name: self.name.clone(),
            channel_id: channel_id.to_string(),
            language: self.language,
            category: self.category.clone(),
            active: true,
        })
    }
}

// ---------------------------------------------------------------------------
// Fetch config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime HTTP configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub rate_limit_ms: u64,
    pub max_redirects: usize,
    pub max_response_bytes: u64,
    pub user_agent: Option<String>,
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.fetch.timeout_secs,
            rate_limit_ms: config.fetch.rate_limit_ms,
            max_redirects: config.fetch.max_redirects,
            max_response_bytes: config.fetch.max_response_bytes,
            user_agent: config.fetch.user_agent.clone(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.tadka/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| TadkaError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.tadka/tadka.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TadkaError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TadkaError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TadkaError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| TadkaError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TadkaError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| TadkaError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("database_path"));
        assert!(toml_str.contains("rate_limit_ms"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.fetch.timeout_secs, 30);
        assert_eq!(parsed.scheduler.tick_secs, 60);
        assert!(parsed.scheduler.run_on_start);
    }

    #[test]
    fn config_with_agents_and_channels() {
        let toml_str = r#"
[defaults]
database_path = "/tmp/tadka.db"
default_language = "telugu"

[[agents]]
name = "telugu-reviews"
kind = "movie-review"
source_url = "https://reviews.example.com/telugu"
language = "telugu"
states = ["AP", "ts"]
schedule_minutes = 120

[[agents]]
name = "trailers"
kind = "video"
keywords = ["trailer", "teaser"]

[[channels]]
name = "Studio Official"
channel_id = "UC1234567890"
language = "tamil"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.default_language, Some(Language::Telugu));
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[1].max_items, 10);
        assert_eq!(config.channels[0].category, "trailers");
        let channel = config.channels[0].to_channel().expect("valid channel");
        assert_eq!(channel.language, Some(Language::Tamil));
        assert!(channel.active);

        let agent = config.agents[0].to_agent().expect("valid seed");
        assert_eq!(agent.kind, AgentKind::MovieReview);
        assert_eq!(agent.states, vec!["ap", "ts"]);
        assert_eq!(agent.schedule_minutes, 120);
        assert!(agent.enabled);
    }

    #[test]
    fn seed_without_source_url_is_rejected() {
        let seed = AgentSeed {
            name: "pics".into(),
            kind: AgentKind::TadkaPics,
            source_url: None,
            language: None,
            states: vec![],
            keywords: vec![],
            max_items: 5,
            schedule_minutes: 0,
            auto_publish: false,
        };
        let err = seed.to_agent().unwrap_err();
        assert!(err.to_string().contains("needs a source_url"));
    }

    #[test]
    fn fetch_config_from_app_config() {
        let app = AppConfig::default();
        let fetch = FetchConfig::from(&app);
        assert_eq!(fetch.timeout_secs, 30);
        assert_eq!(fetch.rate_limit_ms, 500);
        assert_eq!(fetch.max_redirects, 5);
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home("/var/lib/tadka.db").unwrap(),
            PathBuf::from("/var/lib/tadka.db")
        );
        assert!(!expand_home("~/tadka.db").unwrap().starts_with("~"));
    }
}
