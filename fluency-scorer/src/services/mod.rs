//! Pipeline orchestration: feature collection, training and inference

pub mod feature_collector;
pub mod inference;
pub mod metrics;
pub mod split;
pub mod training;

pub use feature_collector::{FeatureCollector, FeatureSet};
pub use inference::{predict, score_features, Predictions};
pub use metrics::ValidationReport;
pub use split::TrainValSplit;
pub use training::{fit_models, train, TrainingOutcome};
