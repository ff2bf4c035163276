//! Jittered, sequential vote submission.
//!
//! Repeatedly calls `vote()` on a contract from one keystore-held account,
//! waiting for each transaction to be included before the next is built and
//! spacing submissions with a CSPRNG-shuffled delay permutation.

pub mod blockchain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod submission;

pub use blockchain::{BlockchainClient, Identity, KeySource, LedgerClient};
pub use config::VoterConfig;
pub use lifecycle::Shutdown;
pub use submission::{RunReport, Scheduler, SubmissionEngine};
