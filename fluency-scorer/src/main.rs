//! fluency-scorer - command-line entry point
//!
//! `train` fits the three models on a labelled index and writes them to the
//! artifact directory; `predict` scores a test index with saved models.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fluency_common::config::{ConfigResolver, EncoderConfig, LoggingConfig, ScorerConfig};
use fluency_scorer::extractors::{Device, SharedEncoder};

/// Command-line arguments for fluency-scorer
#[derive(Parser, Debug)]
#[command(name = "fluency-scorer")]
#[command(about = "Spoken-audio proficiency scorer (stacked regression)")]
#[command(version)]
struct Args {
    /// Config file (falls back to FLUENCY_CONFIG, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the model artifacts
    #[arg(long, global = true, env = "FLUENCY_ARTIFACTS")]
    artifacts: Option<PathBuf>,

    /// Encoder device: cpu, cuda, cuda:N or auto
    #[arg(long, global = true, env = "FLUENCY_DEVICE")]
    device: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit base and meta models on a labelled index
    Train {
        /// CSV with `filename,label`
        #[arg(long, env = "FLUENCY_TRAIN_INDEX")]
        train_index: Option<PathBuf>,

        /// Directory containing the training audio
        #[arg(long, env = "FLUENCY_TRAIN_AUDIO_DIR")]
        audio_dir: Option<PathBuf>,
    },
    /// Score a test index with saved models
    Predict {
        /// CSV with `filename`
        #[arg(long, env = "FLUENCY_TEST_INDEX")]
        test_index: Option<PathBuf>,

        /// Directory containing the test audio
        #[arg(long, env = "FLUENCY_TEST_AUDIO_DIR")]
        audio_dir: Option<PathBuf>,

        /// Submission CSV to write
        #[arg(short, long, env = "FLUENCY_OUTPUT")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The configured subscriber needs the config, so resolution logs through
    // a scoped stderr subscriber
    let resolver = ConfigResolver::new("fluency").with_cli_path(args.config.clone());
    let (mut config, source) =
        tracing::subscriber::with_default(bootstrap_subscriber(), || resolver.resolve())
            .context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging)?;
    info!("Starting fluency-scorer v{}", env!("CARGO_PKG_VERSION"));
    info!(source = ?source, "Configuration resolved");

    let encoder = build_encoder(&config.encoder)?;

    match args.command {
        Command::Train { .. } => {
            let outcome = fluency_scorer::train(&config, encoder)
                .await
                .context("Training failed")?;
            info!(
                dir = %config.artifacts.dir.display(),
                blend_pearson = outcome.report.blend.pearson,
                blend_mse = outcome.report.blend.mse,
                "Training complete"
            );
        }
        Command::Predict { .. } => {
            let predictions = fluency_scorer::predict(&config, encoder)
                .await
                .context("Prediction failed")?;
            info!(
                rows = predictions.ids.len(),
                output = %config.dataset.output.display(),
                "Prediction complete"
            );
        }
    }

    Ok(())
}

/// Command-line and environment values win over the config file
fn apply_overrides(config: &mut ScorerConfig, args: &Args) {
    if let Some(dir) = &args.artifacts {
        config.artifacts.dir = dir.clone();
    }
    if let Some(device) = &args.device {
        config.encoder.device = device.clone();
    }
    match &args.command {
        Command::Train {
            train_index,
            audio_dir,
        } => {
            if let Some(p) = train_index {
                config.dataset.train_index = p.clone();
            }
            if let Some(p) = audio_dir {
                config.dataset.train_audio_dir = p.clone();
            }
        }
        Command::Predict {
            test_index,
            audio_dir,
            output,
        } => {
            if let Some(p) = test_index {
                config.dataset.test_index = p.clone();
            }
            if let Some(p) = audio_dir {
                config.dataset.test_audio_dir = p.clone();
            }
            if let Some(p) = output {
                config.dataset.output = p.clone();
            }
        }
    }
}

/// Stderr subscriber used until the configured one is installed
fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
}

/// RUST_LOG overrides the configured level; output goes to the log file when
/// one is configured, else stderr
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.clone().into());

    let (stderr_layer, file_layer) = match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false);
            (None, Some(layer))
        }
        None => (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

#[cfg(feature = "onnx")]
fn build_encoder(config: &EncoderConfig) -> Result<SharedEncoder> {
    use fluency_scorer::extractors::{AudioEncoder, OnnxEncoder};
    use std::sync::Arc;

    let device: Device = config.device.parse().context("Invalid encoder device")?;
    let model_path = config.model_path.clone();
    let intra_threads = config.intra_threads;
    info!(model = %model_path.display(), device = %device, "Encoder configured");

    Ok(SharedEncoder::lazy(move || {
        let encoder = OnnxEncoder::load(&model_path, device, intra_threads)?;
        Ok(Arc::new(encoder) as Arc<dyn AudioEncoder>)
    }))
}

#[cfg(not(feature = "onnx"))]
fn build_encoder(config: &EncoderConfig) -> Result<SharedEncoder> {
    let device: Device = config.device.parse().context("Invalid encoder device")?;
    anyhow::bail!(
        "no audio encoder backend compiled in (requested {} on {}); rebuild with `--features onnx`",
        config.model_path.display(),
        device
    )
}
