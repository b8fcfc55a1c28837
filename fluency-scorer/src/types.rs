//! Feature vectors, prediction rows and the two output channels

use ndarray::Array2;

/// Number of handcrafted acoustic statistics
pub const HANDCRAFTED_DIM: usize = 13;

/// Names of the handcrafted statistics, in vector order
pub const HANDCRAFTED_FEATURE_NAMES: [&str; HANDCRAFTED_DIM] = [
    "mfcc_mean",
    "mfcc_std",
    "chroma_mean",
    "chroma_std",
    "zcr_mean",
    "zcr_std",
    "rms_mean",
    "rms_std",
    "spectral_contrast_mean",
    "spectral_contrast_std",
    "tonnetz_mean",
    "tonnetz_std",
    "tempo",
];

/// Fixed-length handcrafted acoustic descriptor
///
/// The array type makes the length invariant structural: every value of this
/// type, including the failure sentinel, has exactly 13 entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandcraftedVector(pub [f64; HANDCRAFTED_DIM]);

impl HandcraftedVector {
    /// All-zero vector substituted when extraction fails
    pub const SENTINEL: HandcraftedVector = HandcraftedVector([0.0; HANDCRAFTED_DIM]);

    pub fn is_sentinel(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Mean-pooled encoder output for one sample
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector(pub Vec<f32>);

impl EmbeddingVector {
    pub fn dim(&self) -> usize {
        self.0.len()
    }
}

/// Input row of the meta regressor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetaFeature {
    pub pred_handcrafted: f64,
    pub pred_embedding: f64,
}

impl MetaFeature {
    /// Pair two aligned base prediction vectors into a 2-column matrix
    pub fn matrix(pred_handcrafted: &[f64], pred_embedding: &[f64]) -> Array2<f64> {
        debug_assert_eq!(pred_handcrafted.len(), pred_embedding.len());
        let mut out = Array2::zeros((pred_handcrafted.len(), 2));
        for (i, (&h, &e)) in pred_handcrafted.iter().zip(pred_embedding).enumerate() {
            out[[i, 0]] = h;
            out[[i, 1]] = e;
        }
        out
    }
}

/// Stack handcrafted vectors into a row-per-sample matrix
pub fn handcrafted_matrix(rows: &[HandcraftedVector]) -> Array2<f64> {
    let mut out = Array2::zeros((rows.len(), HANDCRAFTED_DIM));
    for (i, row) in rows.iter().enumerate() {
        for (j, &v) in row.0.iter().enumerate() {
            out[[i, j]] = v;
        }
    }
    out
}

/// Stack embeddings into a row-per-sample matrix
///
/// Callers guarantee a common dimensionality (checked during extraction).
pub fn embedding_matrix(rows: &[EmbeddingVector], dim: usize) -> Array2<f64> {
    let mut out = Array2::zeros((rows.len(), dim));
    for (i, row) in rows.iter().enumerate() {
        for (j, &v) in row.0.iter().enumerate().take(dim) {
            out[[i, j]] = f64::from(v);
        }
    }
    out
}

/// Weights of the diagnostic fixed blend
pub const BLEND_WEIGHT_EMBEDDING: f64 = 0.6;
pub const BLEND_WEIGHT_HANDCRAFTED: f64 = 0.4;

/// Diagnostic channel: fixed-weight blend of the base predictions
///
/// Used only for validation reporting. Never persisted, never clamped into
/// submitted scores.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticBlend(pub Vec<f64>);

impl DiagnosticBlend {
    pub fn compute(pred_handcrafted: &[f64], pred_embedding: &[f64]) -> Self {
        Self(
            pred_handcrafted
                .iter()
                .zip(pred_embedding)
                .map(|(&h, &e)| BLEND_WEIGHT_EMBEDDING * e + BLEND_WEIGHT_HANDCRAFTED * h)
                .collect(),
        )
    }
}

/// Production channel: meta-model output clamped into the score scale
#[derive(Debug, Clone, PartialEq)]
pub struct FinalScores(pub Vec<f64>);

impl FinalScores {
    /// Clamp raw meta predictions into `[min, max]`
    ///
    /// Out-of-range values are not an error. NaN maps to `min`.
    pub fn clamp(raw: &[f64], min: f64, max: f64) -> Self {
        Self(
            raw.iter()
                .map(|&v| if v.is_nan() { min } else { v.clamp(min, max) })
                .collect(),
        )
    }
}
