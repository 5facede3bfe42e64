//! Scheduler Engine — the loop that drives the guest processor.
//!
//! Serial by construction: a cycle always finishes before the next sleep
//! starts, so the polling period is cycle time plus the interval. Each
//! cycle runs in its own tokio task; an error or a panic ends that cycle
//! only. The loop exits only when the shutdown signal fires, and the
//! signal is checked between cycles, never in the middle of one.

use std::sync::Arc;
use std::time::Duration;

use guestpass_core::types::CycleReport;
use serde::Serialize;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

use crate::processor::GuestProcessor;

/// What the loop is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Drives `GuestProcessor` at a fixed interval.
pub struct SchedulerEngine {
    processor: Arc<GuestProcessor>,
    interval: Duration,
    state: watch::Sender<SchedulerState>,
    cycles: u64,
}

impl SchedulerEngine {
    pub fn new(processor: Arc<GuestProcessor>, interval: Duration) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            processor,
            interval,
            state,
            cycles: 0,
        }
    }

    /// Follow state changes (used by the health endpoint).
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }

    /// Run exactly one cycle. Returns `None` if the cycle was aborted by an
    /// error or a panic; either way the engine stays usable.
    pub async fn run_once(&mut self) -> Option<CycleReport> {
        self.cycles += 1;
        let cycle = self.cycles;
        self.state.send_replace(SchedulerState::Running);

        let processor = self.processor.clone();
        let result = tokio::spawn(async move { processor.run().await }).await;
        self.state.send_replace(SchedulerState::Idle);

        match result {
            Ok(Ok(report)) => {
                tracing::info!(
                    "🔁 Cycle {cycle}: {} sent, {} skipped, {} failed ({:.1?})",
                    report.sent(),
                    report.skipped(),
                    report.failed(),
                    report.duration
                );
                if report.unmarked() > 0 {
                    tracing::warn!(
                        "⚠️ Cycle {cycle}: {} guest(s) emailed but not marked done",
                        report.unmarked()
                    );
                }
                Some(report)
            }
            Ok(Err(e)) => {
                tracing::error!(
                    stage = e.stage(),
                    scope = e.scope().as_str(),
                    "❌ Cycle {cycle} aborted: {e}"
                );
                None
            }
            Err(join_err) => {
                tracing::error!("💥 Cycle {cycle} crashed: {join_err}");
                None
            }
        }
    }

    /// Loop until `shutdown` is notified.
    pub async fn run(mut self, shutdown: Arc<Notify>) {
        tracing::info!("⏰ Scheduler started (every {}s)", self.interval.as_secs());

        loop {
            self.run_once().await;

            tokio::select! {
                biased;
                _ = shutdown.notified() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        self.state.send_replace(SchedulerState::Stopped);
        tracing::info!("🛑 Scheduler stopped after {} cycle(s)", self.cycles);
    }
}

/// Spawn the scheduler loop as a background tokio task.
pub fn spawn_scheduler(engine: SchedulerEngine, shutdown: Arc<Notify>) -> JoinHandle<()> {
    tokio::spawn(engine.run(shutdown))
}
