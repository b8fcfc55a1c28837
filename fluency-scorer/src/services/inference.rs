//! Inference pipeline
//!
//! load artifacts → load samples → extract → base predictions → meta
//! prediction → clamp to the score scale → write the submission CSV.

use super::feature_collector::{FeatureCollector, FeatureSet};
use crate::error::{Result, ScorerError};
use crate::extractors::SharedEncoder;
use crate::regressors::{Regressor, TrainedModels};
use crate::types::{embedding_matrix, handcrafted_matrix, FinalScores};
use fluency_common::config::{ScaleConfig, ScorerConfig};
use fluency_common::dataset::{read_test_index, write_scores};
use tracing::info;

/// Scores for one test index, in index order
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    pub ids: Vec<String>,
    pub scores: FinalScores,
}

/// Full inference run driven by `config`
///
/// Artifacts are loaded before any audio is touched, so a missing or
/// corrupt model fails fast.
pub async fn predict(config: &ScorerConfig, encoder: SharedEncoder) -> Result<Predictions> {
    let models = TrainedModels::load(&config.artifacts.dir)?;

    let samples = read_test_index(&config.dataset.test_index, &config.dataset.test_audio_dir)?;
    info!(
        count = samples.len(),
        index = %config.dataset.test_index.display(),
        "Loaded {} test samples",
        samples.len()
    );

    let collector = FeatureCollector::new(&config.extraction, encoder)?;
    let features = collector
        .collect(&samples, Some(models.embedding_dim()))
        .await?;

    let scores = score_features(&models, &features, config.scale)?;
    let ids: Vec<String> = samples.into_iter().map(|s| s.id).collect();

    write_scores(&config.dataset.output, &ids, &scores.0)?;
    info!(
        path = %config.dataset.output.display(),
        rows = ids.len(),
        "Submission written"
    );

    Ok(Predictions { ids, scores })
}

/// Base → meta → clamp for already-extracted features
pub fn score_features(
    models: &TrainedModels,
    features: &FeatureSet,
    scale: ScaleConfig,
) -> Result<FinalScores> {
    if features.embedding_dim != models.embedding_dim() {
        return Err(ScorerError::Dimension {
            expected: models.embedding_dim(),
            actual: features.embedding_dim,
            context: "test embeddings vs trained model".to_string(),
        });
    }

    let pred_hc = models
        .handcrafted
        .predict(&handcrafted_matrix(&features.handcrafted))?;
    let pred_emb = models
        .embedding
        .predict(&embedding_matrix(&features.embeddings, features.embedding_dim))?;
    let raw = models.meta.predict_pairs(&pred_hc, &pred_emb)?;

    let out_of_range = raw
        .iter()
        .filter(|&&v| !(v >= scale.min && v <= scale.max))
        .count();
    if out_of_range > 0 {
        tracing::debug!(out_of_range, "Clamped raw meta predictions into range");
    }

    Ok(FinalScores::clamp(&raw, scale.min, scale.max))
}
