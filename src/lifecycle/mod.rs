//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Probe RPC → Decrypt keystore → Contract → Vote count
//!
//! Signals (signals.rs):
//!     SIGINT (Ctrl-C) → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Scheduler stops between or during cycles → Tally reported
//! ```
//!
//! # Design Decisions
//! - Ordered startup, any failure is fatal before the first cycle
//! - Interruption is not an error: the partial tally is reported and the exit status is 0

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::listen_for_interrupt;
pub use startup::StartupError;
