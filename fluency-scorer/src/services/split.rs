//! Seeded train/validation partition

use crate::error::{Result, ScorerError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of the two disjoint splits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainValSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

impl TrainValSplit {
    /// Shuffle `0..n` with `seed` and hold out `ceil(fraction * n)` rows
    ///
    /// Both sides must end up non-empty.
    pub fn new(n: usize, fraction: f64, seed: u64) -> Result<Self> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ScorerError::Fit(format!(
                "validation fraction must be in (0, 1), got {}",
                fraction
            )));
        }
        let n_val = (fraction * n as f64).ceil() as usize;
        if n_val == 0 || n_val >= n {
            return Err(ScorerError::Fit(format!(
                "cannot split {} samples with validation fraction {}",
                n, fraction
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let validation = indices.split_off(n - n_val);
        Ok(Self {
            train: indices,
            validation,
        })
    }
}

/// Gather `rows` of `values` in the given order
pub fn select<T: Clone>(values: &[T], rows: &[usize]) -> Vec<T> {
    rows.iter().map(|&i| values[i].clone()).collect()
}
