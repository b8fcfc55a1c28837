//! L2-regularised linear regression with a fitted, unpenalised intercept

use super::linalg::cholesky_solve;
use super::{check_features, check_training_data, Regressor};
use crate::error::{Result, ScorerError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Fitted ridge model: `y = x · coefficients + intercept`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegressor {
    pub alpha: f64,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl RidgeRegressor {
    /// Fit on centred data
    ///
    /// Solves the primal normal equations `(XᵀX + αI) w = Xᵀy` when there are
    /// at least as many samples as features, else the dual system
    /// `(XXᵀ + αI) a = y`, `w = Xᵀa`. Both give the same minimiser.
    pub fn fit(features: &Array2<f64>, labels: &[f64], alpha: f64) -> Result<Self> {
        check_training_data(features, labels)?;
        if !(alpha > 0.0) || !alpha.is_finite() {
            return Err(ScorerError::Fit(format!("ridge alpha must be positive, got {}", alpha)));
        }

        let (n_samples, n_features) = features.dim();
        let x_mean = features
            .mean_axis(Axis(0))
            .ok_or_else(|| ScorerError::Fit("ridge: no training rows".to_string()))?;
        let y = Array1::from(labels.to_vec());
        let y_mean = y.sum() / n_samples as f64;

        let xc = features - &x_mean;
        let yc = &y - y_mean;

        let coefficients = if n_features <= n_samples {
            let mut gram = xc.t().dot(&xc);
            for i in 0..n_features {
                gram[[i, i]] += alpha;
            }
            cholesky_solve(&gram, &xc.t().dot(&yc))?
        } else {
            let mut kernel = xc.dot(&xc.t());
            for i in 0..n_samples {
                kernel[[i, i]] += alpha;
            }
            let dual = cholesky_solve(&kernel, &yc)?;
            xc.t().dot(&dual)
        };

        let intercept = y_mean - x_mean.dot(&coefficients);
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ScorerError::Fit("ridge produced non-finite coefficients".to_string()));
        }

        Ok(Self {
            alpha,
            coefficients: coefficients.to_vec(),
            intercept,
        })
    }
}

impl Regressor for RidgeRegressor {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>> {
        check_features(features, self.n_features(), "ridge predict")?;
        let w = Array1::from(self.coefficients.clone());
        Ok(features.dot(&w).mapv(|v| v + self.intercept).to_vec())
    }
}
