//! Validation metrics and the training report

use crate::regressors::MetaRegressor;
use serde::{Deserialize, Serialize};

/// Pearson correlation coefficient; 0 when either side has no variance
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (&x, &y) in a[..n].iter().zip(&b[..n]) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    if denom <= f64::MIN_POSITIVE {
        0.0
    } else {
        cov / denom
    }
}

/// Mean squared error
pub fn mse(predictions: &[f64], targets: &[f64]) -> f64 {
    let n = predictions.len().min(targets.len());
    if n == 0 {
        return 0.0;
    }
    predictions[..n]
        .iter()
        .zip(&targets[..n])
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / n as f64
}

/// Pearson r and MSE of one prediction vector against the validation labels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub pearson: f64,
    pub mse: f64,
}

impl Score {
    pub fn of(predictions: &[f64], targets: &[f64]) -> Self {
        Self {
            pearson: pearson(predictions, targets),
            mse: mse(predictions, targets),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetaWeights {
    pub handcrafted: f64,
    pub embedding: f64,
    pub intercept: f64,
}

impl From<&MetaRegressor> for MetaWeights {
    fn from(meta: &MetaRegressor) -> Self {
        let (handcrafted, embedding, intercept) = meta.weights();
        Self {
            handcrafted,
            embedding,
            intercept,
        }
    }
}

/// Held-out diagnostics of one training run, written as
/// `validation_report.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub n_train: usize,
    pub n_validation: usize,
    pub embedding_dim: usize,
    /// Handcrafted vectors that fell back to the zero sentinel
    pub sentinel_count: usize,
    /// Fixed 0.6/0.4 blend
    pub blend: Score,
    pub handcrafted: Score,
    pub embedding: Score,
    /// Meta model on the rows it was fitted on (in-sample)
    pub meta_in_sample: Score,
    pub meta_weights: MetaWeights,
}

impl ValidationReport {
    pub const FILE_NAME: &'static str = "validation_report.json";

    pub fn log(&self) {
        tracing::info!(
            pearson = self.blend.pearson,
            mse = self.blend.mse,
            "Validation (fixed blend)"
        );
        tracing::info!(
            handcrafted_pearson = self.handcrafted.pearson,
            handcrafted_mse = self.handcrafted.mse,
            embedding_pearson = self.embedding.pearson,
            embedding_mse = self.embedding.mse,
            "Validation (base models)"
        );
        tracing::info!(
            w_handcrafted = self.meta_weights.handcrafted,
            w_embedding = self.meta_weights.embedding,
            intercept = self.meta_weights.intercept,
            "Meta model weights"
        );
    }
}
