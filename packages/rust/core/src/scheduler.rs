//! Timer loop that runs due agents.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use tadka_shared::{AgentConfig, Result, SchedulerConfig};

use crate::agents::{AgentContext, AgentProgress, AgentRunReport, run_agent};

/// Whether a scheduled agent should run at `now`.
///
/// Disabled agents and agents with `schedule_minutes = 0` (manual only) are
/// never due. An agent that has never run is due immediately.
pub fn is_due(agent: &AgentConfig, now: DateTime<Utc>) -> bool {
    if !agent.enabled || agent.schedule_minutes == 0 {
        return false;
    }
    match agent.last_run_at {
        None => true,
        Some(last) => last + chrono::Duration::minutes(i64::from(agent.schedule_minutes)) <= now,
    }
}

/// Runs due agents sequentially on a fixed tick.
pub struct Scheduler<'a> {
    ctx: &'a AgentContext,
    config: SchedulerConfig,
}

impl<'a> Scheduler<'a> {
    pub fn new(ctx: &'a AgentContext, config: SchedulerConfig) -> Self {
        Self { ctx, config }
    }

    /// One pass: run every agent that is due at `now`.
    ///
    /// A failing agent is logged and does not stop the pass.
    #[instrument(skip_all)]
    pub async fn run_due_once(
        &self,
        now: DateTime<Utc>,
        progress: &dyn AgentProgress,
    ) -> Result<Vec<AgentRunReport>> {
        let agents = self.ctx.storage.list_agents().await?;
        let due: Vec<&AgentConfig> = agents.iter().filter(|a| is_due(a, now)).collect();
        debug!(agents = agents.len(), due = due.len(), "scheduler pass");

        let mut reports = Vec::with_capacity(due.len());
        for agent in due {
            match run_agent(self.ctx, agent, progress).await {
                Ok(report) => reports.push(report),
                Err(e) => warn!(agent = %agent.name, error = %e, "agent run failed"),
            }
        }
        Ok(reports)
    }

    /// Tick every `tick_secs` until `shutdown` resolves. A pass that has
    /// started always finishes before the loop stops.
    pub async fn run_until<F>(&self, shutdown: F, progress: &dyn AgentProgress) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let period = Duration::from_secs(self.config.tick_secs.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !self.config.run_on_start {
            // The first tick completes immediately.
            interval.tick().await;
        }

        info!(tick_secs = period.as_secs(), "scheduler started");
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("scheduler stopping");
                    return Ok(());
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_due_once(Utc::now(), progress).await {
                        warn!(error = %e, "scheduler pass failed");
                    }
                }
            }
        }
    }
}
