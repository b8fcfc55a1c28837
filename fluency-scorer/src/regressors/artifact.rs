//! Model artifact persistence
//!
//! Each regressor is stored as one JSON document wrapped in an envelope
//! recording what it is, which format wrote it, when, and the input width it
//! expects. Every document of a set goes to a temporary file first and only
//! then are the files renamed into place.

use super::{GradientBoostingRegressor, MetaRegressor, Regressor, RidgeRegressor};
use crate::error::{Result, ScorerError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FORMAT_VERSION: u32 = 1;

pub const HANDCRAFTED_FILE: &str = "model_handcrafted.json";
pub const EMBEDDING_FILE: &str = "model_embedding.json";
pub const META_FILE: &str = "model_meta.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Handcrafted,
    Embedding,
    Meta,
}

impl ModelKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ModelKind::Handcrafted => HANDCRAFTED_FILE,
            ModelKind::Embedding => EMBEDDING_FILE,
            ModelKind::Meta => META_FILE,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ModelKind::Handcrafted => "handcrafted",
            ModelKind::Embedding => "embedding",
            ModelKind::Meta => "meta",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEnvelope<M> {
    pub kind: ModelKind,
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub n_features: usize,
    pub model: M,
}

/// The three fitted regressors of one training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModels {
    pub handcrafted: GradientBoostingRegressor,
    pub embedding: RidgeRegressor,
    pub meta: MetaRegressor,
}

impl TrainedModels {
    /// Width of the embedding the models were trained on
    pub fn embedding_dim(&self) -> usize {
        self.embedding.n_features()
    }

    /// Write all three artifacts into `dir`
    ///
    /// Every document is staged to a temp file before the first rename, so a
    /// serialisation or write failure leaves the directory untouched. A rename
    /// failing part-way leaves a mix of new and previous artifacts; the
    /// remaining temp files are removed and the error returned.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let trained_at = Utc::now();

        let documents = [
            (
                ModelKind::Handcrafted,
                encode(ModelKind::Handcrafted, trained_at, &self.handcrafted)?,
            ),
            (
                ModelKind::Embedding,
                encode(ModelKind::Embedding, trained_at, &self.embedding)?,
            ),
            (ModelKind::Meta, encode(ModelKind::Meta, trained_at, &self.meta)?),
        ];

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(documents.len());
        for (kind, json) in &documents {
            let target = dir.join(kind.file_name());
            let tmp = dir.join(format!(".{}.tmp", kind.file_name()));
            if let Err(e) = fs::write(&tmp, json) {
                discard(&staged);
                let _ = fs::remove_file(&tmp);
                return Err(e.into());
            }
            staged.push((tmp, target));
        }

        for (i, (tmp, target)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, target) {
                discard(&staged[i..]);
                return Err(e.into());
            }
            debug!(path = %target.display(), "Artifact written");
        }

        info!(dir = %dir.display(), "Saved 3 model artifacts");
        Ok(())
    }

    /// Load and validate all three artifacts from `dir`
    ///
    /// Any missing, unparsable or mismatched document is fatal.
    pub fn load(dir: &Path) -> Result<Self> {
        let handcrafted: GradientBoostingRegressor = read_envelope(dir, ModelKind::Handcrafted)?;
        handcrafted.validate()?;
        if handcrafted.n_features() != crate::types::HANDCRAFTED_DIM {
            return Err(ScorerError::Dimension {
                expected: crate::types::HANDCRAFTED_DIM,
                actual: handcrafted.n_features(),
                context: "handcrafted artifact".to_string(),
            });
        }

        let embedding: RidgeRegressor = read_envelope(dir, ModelKind::Embedding)?;
        let meta: MetaRegressor = read_envelope(dir, ModelKind::Meta)?;
        if meta.n_features() != MetaRegressor::N_INPUTS {
            return Err(ScorerError::Dimension {
                expected: MetaRegressor::N_INPUTS,
                actual: meta.n_features(),
                context: "meta artifact".to_string(),
            });
        }

        info!(
            dir = %dir.display(),
            embedding_dim = embedding.n_features(),
            trees = handcrafted.trees.len(),
            "Loaded model artifacts"
        );
        Ok(Self {
            handcrafted,
            embedding,
            meta,
        })
    }
}

fn encode<M>(kind: ModelKind, trained_at: DateTime<Utc>, model: &M) -> Result<String>
where
    M: Regressor + Serialize,
{
    let envelope = ArtifactEnvelope {
        kind,
        format_version: FORMAT_VERSION,
        trained_at,
        n_features: model.n_features(),
        model,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

fn read_envelope<M>(dir: &Path, kind: ModelKind) -> Result<M>
where
    M: Regressor + DeserializeOwned,
{
    let path = dir.join(kind.file_name());
    let content = fs::read_to_string(&path).map_err(|e| {
        ScorerError::Artifact(format!("cannot read {} artifact {}: {}", kind, path.display(), e))
    })?;
    // Header is checked before the body is interpreted
    let envelope: ArtifactEnvelope<serde_json::Value> =
        serde_json::from_str(&content).map_err(|e| {
            ScorerError::Artifact(format!("corrupt {} artifact {}: {}", kind, path.display(), e))
        })?;

    if envelope.kind != kind {
        return Err(ScorerError::Artifact(format!(
            "{} holds a {} model, expected {}",
            path.display(),
            envelope.kind,
            kind
        )));
    }
    if envelope.format_version != FORMAT_VERSION {
        return Err(ScorerError::Artifact(format!(
            "{} has format version {}, this build reads version {}",
            path.display(),
            envelope.format_version,
            FORMAT_VERSION
        )));
    }

    let model: M = serde_json::from_value(envelope.model).map_err(|e| {
        ScorerError::Artifact(format!("corrupt {} model in {}: {}", kind, path.display(), e))
    })?;
    if model.n_features() != envelope.n_features {
        return Err(ScorerError::Dimension {
            expected: envelope.n_features,
            actual: model.n_features(),
            context: format!("{} artifact body", kind),
        });
    }

    debug!(
        path = %path.display(),
        trained_at = %envelope.trained_at,
        "Artifact read"
    );
    Ok(model)
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}
