//! Periodic eviction of expired rate windows and denylist entries.
//!
//! # Responsibilities
//! - Bound memory by dropping state that evaluation would ignore anyway
//! - Publish state-size gauges
//!
//! # Design Decisions
//! - An expired window reads as reset, so removing it changes no decision
//! - Permanent denylist entries are never swept
//! - With eviction disabled the loop still runs in report-only mode, so the
//!   gauges stay current

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::clock::Clock;
use crate::observability::metrics;
use crate::security::state::{GateState, SweepReport};

pub struct Sweeper {
    state: Arc<GateState>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    evict: bool,
}

impl Sweeper {
    pub fn new(state: Arc<GateState>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            state,
            clock,
            interval,
            evict: true,
        }
    }

    /// Publish state sizes on every tick without evicting anything.
    pub fn report_only(mut self) -> Self {
        self.evict = false;
        self
    }

    /// Run one sweep now.
    pub fn sweep_once(&self) -> SweepReport {
        let report = if self.evict {
            let report = self.state.sweep(self.clock.now());
            metrics::record_sweep(report);
            report
        } else {
            SweepReport::default()
        };
        metrics::record_state_size(self.state.limiter.len(), self.state.denylist.len());

        if report.windows > 0 || report.denylist > 0 {
            tracing::debug!(
                windows = report.windows,
                denylist = report.denylist,
                "Swept expired gate state"
            );
        }
        report
    }

    /// Sweep on every tick until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            evict = self.evict,
            "Sweeper starting"
        );

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately; skip it so the first sweep
        // happens one interval after start.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
