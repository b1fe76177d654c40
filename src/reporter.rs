//! Periodic throughput reporting
//!
//! A timer-driven task that polls a [`ProgressHandle`] on a fixed interval
//! and reports the evaluations completed since the previous tick. It only
//! reads atomics, so it never slows down or blocks the search.

use crate::engine::ProgressHandle;
use crate::utils::{compute_hash_rate, format_hash_rate};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default status interval
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// One status tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    /// Tick number within the current search, starting at 1
    pub tick: u32,
    /// Evaluations completed when the tick fired
    pub evaluations: u64,
    /// Evaluations per second since the previous tick
    pub rate: f64,
}

/// Reports search throughput on a fixed interval
#[derive(Debug)]
pub struct ThroughputReporter {
    interval: Duration,
    abandon_after_ticks: Option<u32>,
    reports_tx: Option<mpsc::UnboundedSender<ProgressReport>>,
}

impl ThroughputReporter {
    /// Create a reporter ticking every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            abandon_after_ticks: None,
            reports_tx: None,
        }
    }

    /// Cancel the search token once this many ticks have elapsed
    pub fn with_abandon_after(mut self, ticks: Option<u32>) -> Self {
        self.abandon_after_ticks = ticks;
        self
    }

    /// Also deliver every report on `tx`
    pub fn with_reports(mut self, tx: mpsc::UnboundedSender<ProgressReport>) -> Self {
        self.reports_tx = Some(tx);
        self
    }

    /// Start reporting on the current tokio runtime
    ///
    /// The task runs until `stop` is cancelled and yields the number of ticks
    /// that fired. `search_cancel` is only cancelled when an abandonment
    /// limit is configured and reached.
    pub fn spawn(
        self,
        progress: ProgressHandle,
        stop: CancellationToken,
        search_cancel: CancellationToken,
    ) -> JoinHandle<u32> {
        tokio::spawn(self.run(progress, stop, search_cancel))
    }

    async fn run(
        self,
        progress: ProgressHandle,
        stop: CancellationToken,
        search_cancel: CancellationToken,
    ) -> u32 {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut previous = 0u64;
        let mut ticks = 0u32;

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    ticks += 1;
                    let evaluations = progress.evaluations_completed();
                    // A smaller count means a new search started since the last tick
                    let delta = evaluations.checked_sub(previous).unwrap_or(evaluations);
                    let rate = compute_hash_rate(delta, self.interval);
                    previous = evaluations;

                    info!(
                        "Count {}, {} ({} bits)",
                        evaluations,
                        format_hash_rate(rate),
                        progress.target_bits()
                    );

                    if let Some(tx) = &self.reports_tx {
                        // Receiver may have gone away
                        let _ = tx.send(ProgressReport { tick: ticks, evaluations, rate });
                    }

                    if self.abandon_after_ticks.is_some_and(|limit| ticks >= limit)
                        && !search_cancel.is_cancelled()
                    {
                        warn!("No collision after {} status ticks, abandoning search", ticks);
                        search_cancel.cancel();
                    }
                }
            }
        }

        ticks
    }
}

impl Default for ThroughputReporter {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_INTERVAL)
    }
}
