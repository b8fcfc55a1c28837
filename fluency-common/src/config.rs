//! Configuration loading and resolution
//!
//! Two tiers, like the other bootstrap configs in this workspace:
//! 1. **TOML bootstrap**: dataset paths, artifact directory, training knobs,
//!    encoder location, logging
//! 2. **Command-line overrides**: applied by the binary on top of the loaded file
//!
//! # Config File Priority
//!
//! 1. Explicit path (`--config`)
//! 2. Environment variable (`FLUENCY_CONFIG`)
//! 3. User config directory (`~/.config/fluency/config.toml` on Linux)
//! 4. Compiled defaults (no file)
//!
//! A missing file is not fatal: a warning is logged and compiled defaults are
//! used. A file that exists but fails to parse is a configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "FLUENCY_CONFIG";

/// Complete scorer configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScorerConfig {
    pub dataset: DatasetConfig,
    pub artifacts: ArtifactConfig,
    pub training: TrainingConfig,
    pub extraction: ExtractionConfig,
    pub encoder: EncoderConfig,
    pub scale: ScaleConfig,
    pub logging: LoggingConfig,
}

/// Sample index and audio root locations
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    /// Training index CSV (`filename,label`)
    pub train_index: PathBuf,
    /// Test index CSV (`filename`)
    pub test_index: PathBuf,
    /// Directory the training filenames are relative to
    pub train_audio_dir: PathBuf,
    /// Directory the test filenames are relative to
    pub test_audio_dir: PathBuf,
    /// Output CSV for predicted scores
    pub output: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            train_index: PathBuf::from("dataset/train.csv"),
            test_index: PathBuf::from("dataset/test.csv"),
            train_audio_dir: PathBuf::from("dataset/audios_train"),
            test_audio_dir: PathBuf::from("dataset/audios_test"),
            output: PathBuf::from("dataset/submission.csv"),
        }
    }
}

/// Where trained model blobs are written and read
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dataset/saved_models"),
        }
    }
}

/// Train/validation split and regressor settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    /// Share of labelled samples held out for meta-model training
    pub validation_fraction: f64,
    /// Seed for the train/validation shuffle
    pub seed: u64,
    /// L2 penalty of the embedding ridge model
    pub ridge_alpha: f64,
    /// L2 penalty of the meta ridge model
    pub meta_alpha: f64,
    pub boosting: BoostingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            validation_fraction: 0.2,
            seed: 42,
            ridge_alpha: 1.0,
            meta_alpha: 1.0,
            boosting: BoostingConfig::default(),
        }
    }
}

/// Gradient-boosted tree settings for the handcrafted model
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Audio loading and worker pool settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Rate every waveform is resampled to before analysis
    pub sample_rate: u32,
    /// Handcrafted extraction threads (None = one per CPU)
    pub workers: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            workers: None,
        }
    }
}

/// Pretrained audio encoder settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EncoderConfig {
    /// ONNX export of the encoder (waveform in, last hidden state out)
    pub model_path: PathBuf,
    /// `cpu`, `cuda`, `cuda:N` or `auto`
    pub device: String,
    /// Intra-op threads for the encoder session
    pub intra_threads: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/wav2vec2-base-960h.onnx"),
            device: "auto".to_string(),
            intra_threads: 4,
        }
    }
}

/// Closed interval every reported score is clamped into
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScaleConfig {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self { min: 0.0, max: 5.0 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl ScorerConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        let fraction = self.training.validation_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(Error::Config(format!(
                "training.validation_fraction must be in (0, 1), got {}",
                fraction
            )));
        }
        if !(self.training.ridge_alpha > 0.0) || !(self.training.meta_alpha > 0.0) {
            return Err(Error::Config(
                "training.ridge_alpha and training.meta_alpha must be positive".to_string(),
            ));
        }
        let boosting = &self.training.boosting;
        if boosting.n_estimators == 0 || boosting.max_depth == 0 {
            return Err(Error::Config(
                "training.boosting needs at least one estimator of depth >= 1".to_string(),
            ));
        }
        if !(boosting.learning_rate > 0.0) {
            return Err(Error::Config(
                "training.boosting.learning_rate must be positive".to_string(),
            ));
        }
        if boosting.min_samples_leaf == 0 || boosting.min_samples_split < 2 {
            return Err(Error::Config(
                "training.boosting needs min_samples_leaf >= 1 and min_samples_split >= 2"
                    .to_string(),
            ));
        }
        if self.extraction.sample_rate == 0 {
            return Err(Error::Config("extraction.sample_rate must be non-zero".to_string()));
        }
        if self.extraction.workers == Some(0) {
            return Err(Error::Config("extraction.workers must be non-zero".to_string()));
        }
        if !(self.scale.min < self.scale.max) {
            return Err(Error::Config(format!(
                "scale.min ({}) must be below scale.max ({})",
                self.scale.min, self.scale.max
            )));
        }
        Ok(())
    }
}

/// Where the resolved configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserConfigDir(PathBuf),
    CompiledDefaults,
}

/// Config file resolver following the priority order in the module docs
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
    app_name: String,
}

impl ConfigResolver {
    pub fn new(app_name: &str) -> Self {
        Self {
            cli_path: None,
            app_name: app_name.to_string(),
        }
    }

    /// Explicit path from the command line (highest priority)
    pub fn with_cli_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_path = path;
        self
    }

    /// Pick the config file location without reading it
    pub fn resolve_source(&self) -> ConfigSource {
        if let Some(path) = &self.cli_path {
            return ConfigSource::CommandLine(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        if let Some(path) = dirs::config_dir().map(|d| d.join(&self.app_name).join("config.toml")) {
            if path.exists() {
                return ConfigSource::UserConfigDir(path);
            }
        }

        ConfigSource::CompiledDefaults
    }

    /// Resolve, read and validate the configuration
    ///
    /// Missing files degrade to compiled defaults with a warning; parse and
    /// validation failures are returned.
    pub fn resolve(&self) -> Result<(ScorerConfig, ConfigSource)> {
        let source = self.resolve_source();
        let path = match &source {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::UserConfigDir(p) => p.clone(),
            ConfigSource::CompiledDefaults => {
                info!("No config file found, using compiled defaults");
                return Ok((ScorerConfig::default(), source));
            }
        };

        if !path.exists() {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            return Ok((ScorerConfig::default(), ConfigSource::CompiledDefaults));
        }

        let config = ScorerConfig::load(&path)?;
        info!("Loaded configuration from {}", path.display());
        Ok((config, source))
    }
}
