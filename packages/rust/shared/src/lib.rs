//! Shared types, error model, region table, and configuration for Tadka.
//!
//! This crate is the foundation depended on by all other Tadka crates.
//! It provides:
//! - [`TadkaError`]: the unified error type
//! - Domain records ([`Article`], [`Gallery`], [`TheaterRelease`], [`OttRelease`],
//!   [`YouTubeVideo`], [`AgentConfig`])
//! - The state → language table ([`regions`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], config loading)

pub mod config;
pub mod error;
pub mod regions;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AgentSeed, AppConfig, ChannelSeed, DefaultsConfig, FetchConfig, FetchPoliciesConfig,
    SchedulerConfig, config_dir, config_file_path, expand_home, init_config, load_config,
    load_config_from,
};
pub use error::{Result, TadkaError};
pub use regions::{ALL_STATES, Language, StateInfo};
pub use types::{
    AgentConfig, AgentKind, AgentRun, Article, ContentStatus, ContentType, Gallery, GalleryImage,
    OttRelease, RecordId, ReviewDetails, TheaterRelease, YouTubeChannel, YouTubeVideo,
};
