//! Agent pipeline for the Tadka CMS.
//!
//! Ties the fetchers and parsers of `tadka-sources` to `tadka-storage`:
//! Scheduler → Fetcher → Parser → Deduplicator → Normalizer → Writer.

pub mod agents;
pub mod dedup;
pub mod gallery_admin;
pub mod media;
pub mod normalize;
pub mod scheduler;
pub mod writer;

pub use agents::{AgentContext, AgentProgress, AgentRunReport, SilentProgress, run_agent};
pub use scheduler::{Scheduler, is_due};

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use tadka_shared::FetchConfig;
    use tadka_sources::Fetcher;
    use tadka_storage::Storage;
    use uuid::Uuid;

    use crate::agents::AgentContext;
    use crate::media::MediaStore;

    /// Context on a fresh temp database and media dir, fetching from local
    /// mock servers without delay. YouTube feeds are read from `feed_base`.
    pub async fn test_context(feed_base: &str) -> (AgentContext, PathBuf) {
        let dir = std::env::temp_dir().join(format!("tadka_core_{}", Uuid::now_v7()));
        let storage = Storage::open(&dir.join("tadka.db")).await.expect("open test db");
        let media = MediaStore::open(dir.join("media")).expect("open media store");
        let fetcher = Fetcher::new(FetchConfig {
            rate_limit_ms: 0,
            timeout_secs: 5,
            ..FetchConfig::default()
        })
        .expect("build fetcher")
        .allow_loopback();

        let mut ctx = AgentContext::new(storage, fetcher, media);
        ctx.feed_base = feed_base.to_string();
        (ctx, dir)
    }
}
