//! Learned embedding descriptor
//!
//! No sentinel on this path: a zero vector is a legitimate point in embedding
//! space, so every failure propagates to the caller.

use super::encoder::{normalize_input, SharedEncoder};
use crate::audio::load_waveform;
use crate::error::{Result, ScorerError};
use crate::types::EmbeddingVector;
use std::path::Path;

/// Waveform → pooled encoder hidden state
#[derive(Debug, Clone)]
pub struct EmbeddingFeatureExtractor {
    encoder: SharedEncoder,
    sample_rate: u32,
}

impl EmbeddingFeatureExtractor {
    pub fn new(encoder: SharedEncoder, sample_rate: u32) -> Self {
        Self {
            encoder,
            sample_rate,
        }
    }

    pub fn extract(&self, path: &Path) -> Result<EmbeddingVector> {
        let sample = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let waveform = load_waveform(path, self.sample_rate).map_err(|source| {
            ScorerError::Extraction {
                sample: sample.clone(),
                source,
            }
        })?;

        let encoder = self.encoder.get()?;
        let pooled = encoder.encode(&normalize_input(&waveform.samples))?;

        if pooled.is_empty() {
            return Err(ScorerError::Encoder(format!("empty embedding for {}", sample)));
        }
        if let Some(expected) = encoder.hidden_size() {
            if pooled.len() != expected {
                return Err(ScorerError::Dimension {
                    expected,
                    actual: pooled.len(),
                    context: format!("encoder output for {}", sample),
                });
            }
        }
        if pooled.iter().any(|v| !v.is_finite()) {
            return Err(ScorerError::Encoder(format!(
                "non-finite embedding for {}",
                sample
            )));
        }

        tracing::debug!(sample = %sample, dim = pooled.len(), "Embedding extracted");
        Ok(EmbeddingVector(pooled))
    }
}
