//! Escalating search campaign
//!
//! Runs one search per target level, starting at the configured target and
//! raising it by one bit each round. Every search runs on a blocking worker
//! with a [`ThroughputReporter`] beside it; the next round only starts once
//! the previous search has returned the engine.

use crate::crypto::BlockHasher;
use crate::engine::Engine;
use crate::reporter::ThroughputReporter;
use crate::utils::{format_digest, format_elapsed};
use crate::{Error, Result, Target};
use std::time::{Duration, Instant};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// When to raise the target and when to stop
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignPolicy {
    /// Target of the first round
    pub start_target: Target,
    /// Target of the last round
    pub max_target: Target,
    /// Interval between status reports
    pub report_interval: Duration,
    /// A round needing this many status reports ends the campaign
    pub max_ticks: u32,
    /// Abandon a round after this many status reports
    pub abandon_after_ticks: Option<u32>,
}

impl Default for CampaignPolicy {
    fn default() -> Self {
        Self {
            start_target: Target::MIN,
            max_target: Target::new(32),
            report_interval: crate::reporter::DEFAULT_REPORT_INTERVAL,
            max_ticks: 10,
            abandon_after_ticks: None,
        }
    }
}

/// How a single round ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundResult {
    /// A collision was found
    Found { counter: u32, digest: Vec<u8> },
    /// No counter meets the target
    Exhausted,
    /// The round hit its tick limit
    Abandoned,
}

/// Record of one round
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    /// Target searched for
    pub target: Target,
    /// How the round ended
    pub result: RoundResult,
    /// Evaluations performed
    pub evaluations: u64,
    /// Status reports that fired during the round
    pub ticks: u32,
    /// Wall-clock time of the round
    pub elapsed: Duration,
}

impl RoundOutcome {
    /// Counter of the collision, if one was found
    pub fn counter(&self) -> Option<u32> {
        match self.result {
            RoundResult::Found { counter, .. } => Some(counter),
            _ => None,
        }
    }
}

/// Rounds performed by a campaign
#[derive(Debug, Clone, Default)]
pub struct CampaignSummary {
    /// Every round in order
    pub rounds: Vec<RoundOutcome>,
}

impl CampaignSummary {
    /// Hardest round that produced a collision
    pub fn best(&self) -> Option<&RoundOutcome> {
        self.rounds
            .iter()
            .filter(|round| round.counter().is_some())
            .max_by_key(|round| round.target)
    }

    /// Evaluations across all rounds
    pub fn total_evaluations(&self) -> u64 {
        self.rounds.iter().map(|round| round.evaluations).sum()
    }
}

/// Drives an [`Engine`] through rising targets
#[derive(Debug)]
pub struct Campaign<H> {
    engine: Engine<H>,
    policy: CampaignPolicy,
}

impl<H> Campaign<H>
where
    H: BlockHasher + 'static,
{
    /// Create a campaign over an engine whose base string is already set
    pub fn new(engine: Engine<H>, policy: CampaignPolicy) -> Self {
        Self { engine, policy }
    }

    /// Run rounds until a stop condition is met
    ///
    /// Stops after the round at `max_target`, after a round that needed
    /// `max_ticks` status reports, or after a round that was exhausted or
    /// abandoned.
    pub async fn run(self) -> Result<CampaignSummary> {
        let Self { mut engine, policy } = self;
        let mut summary = CampaignSummary::default();
        let mut target = policy.start_target;

        loop {
            info!(
                "--------- Round {}: target {} (~{:.0} evaluations expected)",
                summary.rounds.len() + 1,
                target,
                target.expected_evaluations()
            );
            engine.set_target(target.bits());

            let (returned, outcome) = run_round(engine, &policy).await?;
            engine = returned;
            log_outcome(&outcome);

            let keep_going = matches!(outcome.result, RoundResult::Found { .. })
                && outcome.ticks < policy.max_ticks
                && target < policy.max_target;
            summary.rounds.push(outcome);

            if !keep_going {
                break;
            }
            target = target.next();
        }

        info!(
            "Terminating search after {} rounds and {} evaluations",
            summary.rounds.len(),
            summary.total_evaluations()
        );
        Ok(summary)
    }
}

/// Run one search on a blocking worker with a reporter alongside
async fn run_round<H>(mut engine: Engine<H>, policy: &CampaignPolicy) -> Result<(Engine<H>, RoundOutcome)>
where
    H: BlockHasher + 'static,
{
    let target = engine.target();
    let progress = engine.progress();
    let stop_reporter = CancellationToken::new();
    let search_cancel = CancellationToken::new();

    let reporter = ThroughputReporter::new(policy.report_interval)
        .with_abandon_after(policy.abandon_after_ticks)
        .spawn(progress.clone(), stop_reporter.clone(), search_cancel.clone());

    let started = Instant::now();
    let (engine, result) = task::spawn_blocking(move || {
        let result = engine.search_until(&search_cancel);
        (engine, result)
    })
    .await?;
    let elapsed = started.elapsed();

    stop_reporter.cancel();
    let ticks = reporter.await?;

    let result = match result {
        Ok(counter) => RoundResult::Found {
            counter,
            digest: engine.digest_for(counter).as_ref().to_vec(),
        },
        Err(Error::Exhausted { .. }) => RoundResult::Exhausted,
        Err(Error::Abandoned { .. }) => RoundResult::Abandoned,
        Err(e) => return Err(e),
    };

    let outcome = RoundOutcome {
        target,
        result,
        evaluations: progress.evaluations_completed(),
        ticks,
        elapsed,
    };
    Ok((engine, outcome))
}

fn log_outcome(outcome: &RoundOutcome) {
    match &outcome.result {
        RoundResult::Found { counter, digest } => {
            info!(
                "Collision found at counter value {:x} in {}",
                counter,
                format_elapsed(outcome.elapsed)
            );
            info!("Digest: {}", format_digest(digest));
        }
        RoundResult::Exhausted => {
            warn!(
                "No collision for {} within the 32-bit counter space",
                outcome.target
            );
        }
        RoundResult::Abandoned => {
            warn!(
                "Gave up on {} after {} status reports",
                outcome.target, outcome.ticks
            );
        }
    }
}
