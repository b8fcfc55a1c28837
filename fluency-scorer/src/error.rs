//! Error types for fluency-scorer
//!
//! Two layers:
//! - [`ExtractionError`]: one sample's feature extraction failed. The
//!   handcrafted path collapses it to the zero sentinel, the embedding path
//!   escalates it.
//! - [`ScorerError`]: anything that aborts a training or inference run.

use std::path::PathBuf;
use thiserror::Error;

/// Per-sample feature extraction failure
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// File could not be opened or read
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Container or codec could not be decoded
    #[error("Decode failed for {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Sample rate conversion failed
    #[error("Resample failed: {0}")]
    Resample(String),

    /// Signal too short or silent for the requested analysis
    #[error("Degenerate signal: {0}")]
    DegenerateSignal(String),

    /// NaN or infinity in the waveform or a derived statistic
    #[error("Non-finite value in {0}")]
    NonFinite(String),
}

/// Main error type for fluency-scorer
#[derive(Debug, Error)]
pub enum ScorerError {
    /// Configuration, dataset or other shared-layer error
    #[error(transparent)]
    Common(#[from] fluency_common::Error),

    /// Unrecoverable extraction failure (embedding path)
    #[error("Extraction failed for sample {sample}: {source}")]
    Extraction {
        sample: String,
        #[source]
        source: ExtractionError,
    },

    /// Pretrained encoder could not be loaded or run
    #[error("Encoder error: {0}")]
    Encoder(String),

    /// Feature dimensionality differs from what the run or artifact expects
    #[error("Dimension mismatch: expected {expected}, got {actual} ({context})")]
    Dimension {
        expected: usize,
        actual: usize,
        context: String,
    },

    /// Degenerate training data (empty split, NaNs, singular system)
    #[error("Model fit failed: {0}")]
    Fit(String),

    /// Missing, corrupt or incompatible model artifact
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// File I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report or artifact serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Background task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(String),
}

/// Convenience Result type using ScorerError
pub type Result<T> = std::result::Result<T, ScorerError>;
