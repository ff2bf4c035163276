//! Vote submission subsystem.
//!
//! # Data Flow
//! ```text
//! Scheduler::run(count)
//!     → shuffler.rs (one delay permutation per run)
//!     → engine.rs (one cycle: balance → nonce → gas → build → sign → broadcast → receipt)
//!     → tally.rs (attempted / succeeded)
//!     → sleep(permutation[i mod len]) between cycles
//! ```
//!
//! # Design Decisions
//! - Strictly sequential; one account never has two cycles in flight
//! - Cycle failures are values, not panics; the run always continues
//! - No retry inside a cycle

pub mod engine;
pub mod scheduler;
pub mod shuffler;
pub mod tally;

pub use engine::{CycleError, CycleOutcome, Stage, SubmissionEngine};
pub use scheduler::{RunReport, Scheduler, SchedulerError};
pub use shuffler::{permutation_with, secure_permutation, DelaySchedule, ShuffleError};
pub use tally::OutcomeTally;
