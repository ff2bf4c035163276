//! Jittered delay generation.
//!
//! A run draws every inter-cycle delay from one permutation of the configured
//! range, shuffled with the operating system's CSPRNG so the spacing cannot be
//! predicted or replayed.

use std::time::Duration;

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShuffleError {
    #[error("invalid delay bounds: low {low} is greater than high {high}")]
    InvalidBounds { low: u64, high: u64 },

    #[error("secure random source unavailable: {0}")]
    EntropyUnavailable(#[from] rand::Error),
}

/// Permutation of `low..=high` from the OS random source.
pub fn secure_permutation(low: u64, high: u64) -> Result<Vec<u64>, ShuffleError> {
    // Fail up front instead of panicking mid-shuffle
    let mut probe = [0u8; 8];
    OsRng.try_fill_bytes(&mut probe)?;

    permutation_with(&mut OsRng, low, high)
}

/// Fisher–Yates shuffle of `low..=high` driven by `rng`.
pub fn permutation_with<R>(rng: &mut R, low: u64, high: u64) -> Result<Vec<u64>, ShuffleError>
where
    R: RngCore + CryptoRng,
{
    if low > high {
        return Err(ShuffleError::InvalidBounds { low, high });
    }

    let mut values: Vec<u64> = (low..=high).collect();
    for i in (1..values.len()).rev() {
        let j = rng.gen_range(0..=i);
        values.swap(i, j);
    }
    Ok(values)
}

/// Delays for one run, indexed cyclically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelaySchedule {
    permutation: Vec<u64>,
}

impl DelaySchedule {
    /// Shuffle `low..=high` once for the whole run.
    pub fn generate(low: u64, high: u64) -> Result<Self, ShuffleError> {
        Ok(Self {
            permutation: secure_permutation(low, high)?,
        })
    }

    /// Use a fixed sequence of delays (seconds). Must not be empty.
    pub fn from_secs(permutation: Vec<u64>) -> Option<Self> {
        (!permutation.is_empty()).then_some(Self { permutation })
    }

    /// Wait applied after cycle `index` (zero-based), wrapping around.
    pub fn delay_after(&self, index: usize) -> Duration {
        Duration::from_secs(self.permutation[index % self.permutation.len()])
    }

    pub fn as_secs(&self) -> &[u64] {
        &self.permutation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    fn assert_is_permutation(values: &[u64], low: u64, high: u64) {
        assert_eq!(values.len() as u64, high - low + 1);
        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (low..=high).collect::<Vec<_>>());
    }

    #[test]
    fn test_reference_range() {
        let values = secure_permutation(30, 60).unwrap();
        assert_eq!(values.len(), 31);
        assert_is_permutation(&values, 30, 60);
    }

    #[test]
    fn test_various_bounds() {
        for (low, high) in [(0, 0), (5, 5), (1, 2), (0, 99), (1000, 1003)] {
            assert_is_permutation(&secure_permutation(low, high).unwrap(), low, high);
        }
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(matches!(
            secure_permutation(60, 30),
            Err(ShuffleError::InvalidBounds { low: 60, high: 30 })
        ));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = permutation_with(&mut StdRng::seed_from_u64(7), 30, 60).unwrap();
        let b = permutation_with(&mut StdRng::seed_from_u64(7), 30, 60).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_orders_vary_between_runs() {
        let orders: HashSet<Vec<u64>> =
            (0..20).map(|_| secure_permutation(30, 60).unwrap()).collect();
        // 31! orderings; any repeat among 20 draws is vanishingly unlikely
        assert!(orders.len() > 1);
    }

    #[test]
    fn test_first_position_roughly_uniform() {
        let draws = 1000;
        let mut first: HashMap<u64, usize> = HashMap::new();
        let mut distinct = HashSet::new();
        for _ in 0..draws {
            let order = secure_permutation(0, 4).unwrap();
            *first.entry(order[0]).or_default() += 1;
            distinct.insert(order);
        }

        // expected 200 per value, sd ~12.6
        for value in 0..5 {
            let count = first.get(&value).copied().unwrap_or(0);
            assert!((120..=280).contains(&count), "value {value} led {count} times");
        }
        assert!(distinct.len() > 100, "only {} of 120 orderings seen", distinct.len());
    }

    #[test]
    fn test_delay_schedule_wraps() {
        let schedule = DelaySchedule::from_secs(vec![31, 45, 30]).unwrap();
        assert_eq!(schedule.delay_after(0), Duration::from_secs(31));
        assert_eq!(schedule.delay_after(2), Duration::from_secs(30));
        assert_eq!(schedule.delay_after(3), Duration::from_secs(31));
        assert_eq!(schedule.delay_after(7), Duration::from_secs(45));
        assert!(DelaySchedule::from_secs(Vec::new()).is_none());
    }
}
