//! Drives N sequential cycles with jittered spacing.
//!
//! Cycles never overlap: the next cycle's nonce is read only after the
//! previous cycle has fully finished, whatever its outcome.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::sleep;

use crate::blockchain::LedgerClient;
use crate::lifecycle::shutdown::{already_triggered, triggered};
use crate::submission::engine::SubmissionEngine;
use crate::submission::shuffler::DelaySchedule;
use crate::submission::tally::OutcomeTally;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("vote count must be a positive integer")]
    InvalidCount,
}

/// Summary of a finished (or interrupted) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub tally: OutcomeTally,
    /// Whether a user interrupt cut the run short.
    pub interrupted: bool,
    /// Inter-cycle waits that completed, in order.
    pub delays: Vec<Duration>,
}

pub struct Scheduler<C> {
    engine: SubmissionEngine<C>,
    delays: DelaySchedule,
}

impl<C: LedgerClient> Scheduler<C> {
    pub fn new(engine: SubmissionEngine<C>, delays: DelaySchedule) -> Self {
        Self { engine, delays }
    }

    /// Run `count` cycles, sleeping between consecutive cycles.
    ///
    /// Stops early when `shutdown` fires; the partial tally is still returned.
    pub async fn run(
        &self,
        count: u32,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<RunReport, SchedulerError> {
        if count == 0 {
            return Err(SchedulerError::InvalidCount);
        }

        tracing::info!(count, delays = ?self.delays.as_secs(), "Starting vote sequence");

        let mut report = RunReport {
            tally: OutcomeTally::default(),
            interrupted: false,
            delays: Vec::new(),
        };

        for i in 0..count {
            // A cycle that never started is not an attempt.
            if already_triggered(&mut shutdown) {
                report.interrupted = true;
                break;
            }
            tracing::info!(vote = i + 1, total = count, "Starting vote");

            let outcome = tokio::select! {
                biased;
                _ = triggered(&mut shutdown) => None,
                outcome = self.engine.submit(i + 1) => Some(outcome),
            };
            let Some(outcome) = outcome else {
                report.tally.record(false);
                report.interrupted = true;
                break;
            };
            report.tally.record(outcome.is_success());

            if i + 1 == count {
                break;
            }

            let delay = self.delays.delay_after(i as usize);
            tracing::info!(secs = delay.as_secs(), "Waiting before next vote");
            tokio::select! {
                biased;
                _ = triggered(&mut shutdown) => {
                    report.interrupted = true;
                    break;
                }
                _ = sleep(delay) => report.delays.push(delay),
            }
        }

        if report.interrupted {
            tracing::warn!(
                attempted = report.tally.attempted,
                succeeded = report.tally.succeeded,
                "Run interrupted by user"
            );
        } else {
            tracing::info!(
                attempted = report.tally.attempted,
                succeeded = report.tally.succeeded,
                "Run complete"
            );
        }

        Ok(report)
    }
}
