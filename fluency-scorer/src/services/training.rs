//! Training pipeline
//!
//! load samples → extract → split → fit base models on the train split →
//! predict the validation split → fit the meta model on those held-out
//! predictions → persist → report.
//!
//! Nothing is written until every model has been fitted.

use super::feature_collector::{FeatureCollector, FeatureSet};
use super::metrics::{MetaWeights, Score, ValidationReport};
use super::split::{select, TrainValSplit};
use crate::error::{Result, ScorerError};
use crate::extractors::SharedEncoder;
use crate::regressors::{
    GradientBoostingRegressor, MetaRegressor, Regressor, RidgeRegressor, TrainedModels,
};
use crate::types::{embedding_matrix, handcrafted_matrix, DiagnosticBlend, MetaFeature};
use fluency_common::config::{ScorerConfig, TrainingConfig};
use fluency_common::dataset::read_train_index;
use std::fs;
use std::path::Path;
use tracing::info;

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub models: TrainedModels,
    pub report: ValidationReport,
    pub split: TrainValSplit,
}

/// Full training run driven by `config`
pub async fn train(config: &ScorerConfig, encoder: SharedEncoder) -> Result<TrainingOutcome> {
    let samples = read_train_index(
        &config.dataset.train_index,
        &config.dataset.train_audio_dir,
        &config.scale,
    )?;
    info!(
        count = samples.len(),
        index = %config.dataset.train_index.display(),
        "Loaded {} training samples",
        samples.len()
    );

    let labels: Vec<f64> = samples
        .iter()
        .map(|s| {
            s.label.ok_or_else(|| {
                ScorerError::Fit(format!("training sample {} has no label", s.id))
            })
        })
        .collect::<Result<_>>()?;

    let collector = FeatureCollector::new(&config.extraction, encoder)?;
    let features = collector.collect(&samples, None).await?;

    let outcome = fit_models(&features, &labels, &config.training)?;
    persist(&outcome, &config.artifacts.dir)?;
    outcome.report.log();
    Ok(outcome)
}

/// Fit the base and meta models on already-extracted features
pub fn fit_models(
    features: &FeatureSet,
    labels: &[f64],
    params: &TrainingConfig,
) -> Result<TrainingOutcome> {
    if features.len() != labels.len() || features.embeddings.len() != labels.len() {
        return Err(ScorerError::Fit(format!(
            "{} handcrafted rows, {} embedding rows, {} labels",
            features.len(),
            features.embeddings.len(),
            labels.len()
        )));
    }

    let split = TrainValSplit::new(labels.len(), params.validation_fraction, params.seed)?;
    info!(
        train = split.train.len(),
        validation = split.validation.len(),
        seed = params.seed,
        "Split samples"
    );

    let y_train = select(labels, &split.train);
    let y_val = select(labels, &split.validation);

    let hc_train = handcrafted_matrix(&select(&features.handcrafted, &split.train));
    let hc_val = handcrafted_matrix(&select(&features.handcrafted, &split.validation));
    let emb_train = embedding_matrix(
        &select(&features.embeddings, &split.train),
        features.embedding_dim,
    );
    let emb_val = embedding_matrix(
        &select(&features.embeddings, &split.validation),
        features.embedding_dim,
    );

    info!(trees = params.boosting.n_estimators, "Fitting handcrafted model");
    let handcrafted = GradientBoostingRegressor::fit(&hc_train, &y_train, &params.boosting)?;
    info!(dim = features.embedding_dim, alpha = params.ridge_alpha, "Fitting embedding model");
    let embedding = RidgeRegressor::fit(&emb_train, &y_train, params.ridge_alpha)?;

    let pred_hc = handcrafted.predict(&hc_val)?;
    let pred_emb = embedding.predict(&emb_val)?;

    info!(rows = y_val.len(), "Fitting meta model on held-out predictions");
    let meta_x = MetaFeature::matrix(&pred_hc, &pred_emb);
    let meta = MetaRegressor::fit(&meta_x, &y_val, params.meta_alpha)?;
    let meta_pred = meta.predict(&meta_x)?;

    let blend = DiagnosticBlend::compute(&pred_hc, &pred_emb);
    let report = ValidationReport {
        n_train: split.train.len(),
        n_validation: split.validation.len(),
        embedding_dim: features.embedding_dim,
        sentinel_count: features.sentinel_count,
        blend: Score::of(&blend.0, &y_val),
        handcrafted: Score::of(&pred_hc, &y_val),
        embedding: Score::of(&pred_emb, &y_val),
        meta_in_sample: Score::of(&meta_pred, &y_val),
        meta_weights: MetaWeights::from(&meta),
    };

    Ok(TrainingOutcome {
        models: TrainedModels {
            handcrafted,
            embedding,
            meta,
        },
        report,
        split,
    })
}

fn persist(outcome: &TrainingOutcome, dir: &Path) -> Result<()> {
    outcome.models.save(dir)?;
    let report_path = dir.join(ValidationReport::FILE_NAME);
    fs::write(&report_path, serde_json::to_string_pretty(&outcome.report)?)?;
    info!(path = %report_path.display(), "Validation report written");
    Ok(())
}
