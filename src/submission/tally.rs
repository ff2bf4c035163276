//! Per-run outcome counters.

use std::fmt;

/// Attempted and succeeded cycle counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub attempted: u32,
    pub succeeded: u32,
}

impl OutcomeTally {
    pub fn record(&mut self, succeeded: bool) {
        self.attempted += 1;
        if succeeded {
            self.succeeded += 1;
        }
    }

    pub fn failed(&self) -> u32 {
        self.attempted - self.succeeded
    }
}

impl fmt::Display for OutcomeTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.succeeded, self.attempted)
    }
}
