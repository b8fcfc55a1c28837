//! fluency-scorer library interface
//!
//! Scores spoken-audio samples on a bounded proficiency scale by stacking
//! two base regressors (handcrafted acoustic statistics, pretrained-encoder
//! embeddings) under a ridge meta model.

pub mod audio;
pub mod dsp;
pub mod error;
pub mod extractors;
pub mod regressors;
pub mod services;
pub mod types;

pub use crate::error::{ExtractionError, Result, ScorerError};
pub use crate::extractors::{AudioEncoder, Device, SharedEncoder};
pub use crate::regressors::TrainedModels;
pub use crate::services::{predict, train, Predictions, TrainingOutcome, ValidationReport};
