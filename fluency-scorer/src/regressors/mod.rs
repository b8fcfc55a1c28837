//! Base and meta regressors plus their persisted form
//!
//! - Handcrafted base: [`GradientBoostingRegressor`]
//! - Embedding base: [`RidgeRegressor`]
//! - Stacking: [`MetaRegressor`]

pub mod artifact;
pub mod gradient_boosting;
pub mod linalg;
pub mod meta;
pub mod ridge;

pub use artifact::{ModelKind, TrainedModels};
pub use gradient_boosting::GradientBoostingRegressor;
pub use meta::MetaRegressor;
pub use ridge::RidgeRegressor;

use crate::error::{Result, ScorerError};
use ndarray::Array2;

/// A fitted model mapping feature rows to scalars
pub trait Regressor {
    /// Input width the model was fitted on
    fn n_features(&self) -> usize;

    /// One prediction per row, in row order
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>>;
}

/// Reject empty, misaligned or non-finite training data
pub(crate) fn check_training_data(features: &Array2<f64>, labels: &[f64]) -> Result<()> {
    if features.nrows() == 0 {
        return Err(ScorerError::Fit("no training rows".to_string()));
    }
    if features.ncols() == 0 {
        return Err(ScorerError::Fit("feature matrix has no columns".to_string()));
    }
    if features.nrows() != labels.len() {
        return Err(ScorerError::Fit(format!(
            "{} feature rows but {} labels",
            features.nrows(),
            labels.len()
        )));
    }
    if features.iter().any(|v| !v.is_finite()) {
        return Err(ScorerError::Fit("non-finite value in feature matrix".to_string()));
    }
    if labels.iter().any(|v| !v.is_finite()) {
        return Err(ScorerError::Fit("non-finite label".to_string()));
    }
    Ok(())
}

pub(crate) fn check_features(features: &Array2<f64>, expected: usize, context: &str) -> Result<()> {
    if features.ncols() != expected {
        return Err(ScorerError::Dimension {
            expected,
            actual: features.ncols(),
            context: context.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_checks() {
        let x = Array2::zeros((3, 2));
        assert!(check_training_data(&x, &[0.0; 3]).is_ok());
        assert!(check_training_data(&x, &[0.0; 2]).is_err());
        assert!(check_training_data(&Array2::zeros((0, 2)), &[]).is_err());
        assert!(check_training_data(&x, &[0.0, f64::NAN, 1.0]).is_err());

        let mut bad = x.clone();
        bad[[1, 1]] = f64::INFINITY;
        assert!(check_training_data(&bad, &[0.0; 3]).is_err());
    }
}
