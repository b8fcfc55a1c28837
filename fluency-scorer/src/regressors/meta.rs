//! Second-stage (stacking) model over the two base predictions

use super::ridge::RidgeRegressor;
use super::Regressor;
use crate::error::{Result, ScorerError};
use crate::types::MetaFeature;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Ridge over `(pred_handcrafted, pred_embedding)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaRegressor {
    pub ridge: RidgeRegressor,
}

impl MetaRegressor {
    pub const N_INPUTS: usize = 2;

    /// Fit on held-out base predictions
    pub fn fit(meta_features: &Array2<f64>, labels: &[f64], alpha: f64) -> Result<Self> {
        if meta_features.ncols() != Self::N_INPUTS {
            return Err(ScorerError::Dimension {
                expected: Self::N_INPUTS,
                actual: meta_features.ncols(),
                context: "meta features".to_string(),
            });
        }
        Ok(Self {
            ridge: RidgeRegressor::fit(meta_features, labels, alpha)?,
        })
    }

    /// Convenience wrapper pairing the two base prediction vectors
    pub fn predict_pairs(&self, pred_handcrafted: &[f64], pred_embedding: &[f64]) -> Result<Vec<f64>> {
        if pred_handcrafted.len() != pred_embedding.len() {
            return Err(ScorerError::Dimension {
                expected: pred_handcrafted.len(),
                actual: pred_embedding.len(),
                context: "base prediction vectors".to_string(),
            });
        }
        self.predict(&MetaFeature::matrix(pred_handcrafted, pred_embedding))
    }

    /// Learned blend weights `(handcrafted, embedding, intercept)`
    pub fn weights(&self) -> (f64, f64, f64) {
        let c = &self.ridge.coefficients;
        (
            c.first().copied().unwrap_or(0.0),
            c.get(1).copied().unwrap_or(0.0),
            self.ridge.intercept,
        )
    }
}

impl Regressor for MetaRegressor {
    fn n_features(&self) -> usize {
        self.ridge.n_features()
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>> {
        self.ridge.predict(features)
    }
}
