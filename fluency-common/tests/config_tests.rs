//! Config file resolution and graceful degradation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate FLUENCY_CONFIG are marked with #[serial].

use fluency_common::config::{ConfigResolver, ConfigSource, ScorerConfig, CONFIG_ENV_VAR};
use fluency_common::Error;
use serial_test::serial;
use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// In-memory log sink for a scoped subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
#[serial]
fn test_cli_path_wins_over_environment() {
    let dir = TempDir::new().unwrap();
    let cli = dir.path().join("cli.toml");
    let envp = dir.path().join("env.toml");
    std::fs::write(&cli, "[training]\nseed = 1\n").unwrap();
    std::fs::write(&envp, "[training]\nseed = 2\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &envp);

    let (config, source) = ConfigResolver::new("fluency-test")
        .with_cli_path(Some(cli.clone()))
        .resolve()
        .unwrap();

    env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(source, ConfigSource::CommandLine(cli));
    assert_eq!(config.training.seed, 1);
}

#[test]
#[serial]
fn test_environment_path_used_without_cli() {
    let dir = TempDir::new().unwrap();
    let envp = dir.path().join("env.toml");
    std::fs::write(&envp, "[encoder]\ndevice = \"cpu\"\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &envp);

    let (config, source) = ConfigResolver::new("fluency-test").resolve().unwrap();

    env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(source, ConfigSource::Environment(envp));
    assert_eq!(config.encoder.device, "cpu");
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    env::remove_var(CONFIG_ENV_VAR);

    let (config, source) = ConfigResolver::new("fluency-test")
        .with_cli_path(Some(PathBuf::from("/nonexistent/fluency.toml")))
        .resolve()
        .unwrap();

    assert_eq!(source, ConfigSource::CompiledDefaults);
    assert_eq!(config, ScorerConfig::default());
}

#[test]
#[serial]
fn test_missing_file_warning_reaches_scoped_subscriber() {
    env::remove_var(CONFIG_ENV_VAR);

    let logs = CapturedLogs::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || sink.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();

    let (_, source) = tracing::subscriber::with_default(subscriber, || {
        ConfigResolver::new("fluency-test")
            .with_cli_path(Some(PathBuf::from("/nonexistent/fluency.toml")))
            .resolve()
    })
    .unwrap();

    let output = logs.contents();
    assert_eq!(source, ConfigSource::CompiledDefaults);
    assert!(output.contains("WARN"), "{}", output);
    assert!(output.contains("/nonexistent/fluency.toml not found"), "{}", output);
}

#[test]
#[serial]
fn test_invalid_values_are_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[training]\nvalidation_fraction = 0.0\n").unwrap();

    let result = ConfigResolver::new("fluency-test")
        .with_cli_path(Some(path))
        .resolve();

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_full_file_parses() {
    let config = ScorerConfig::from_toml_str(
        r#"
        [dataset]
        train_index = "/data/train.csv"
        test_index = "/data/test.csv"
        train_audio_dir = "/data/train"
        test_audio_dir = "/data/test"
        output = "/data/out.csv"

        [artifacts]
        dir = "/data/models"

        [training]
        validation_fraction = 0.25
        seed = 3
        ridge_alpha = 0.5
        meta_alpha = 2.0

        [training.boosting]
        n_estimators = 50
        learning_rate = 0.05
        max_depth = 2

        [extraction]
        sample_rate = 16000
        workers = 2

        [encoder]
        model_path = "/models/encoder.onnx"
        device = "cuda:1"
        intra_threads = 2

        [logging]
        level = "debug"
        file = "/tmp/fluency.log"
        "#,
    )
    .unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.dataset.train_index, PathBuf::from("/data/train.csv"));
    assert_eq!(config.artifacts.dir, PathBuf::from("/data/models"));
    assert_eq!(config.training.boosting.n_estimators, 50);
    assert_eq!(config.training.boosting.min_samples_leaf, 1);
    assert_eq!(config.extraction.workers, Some(2));
    assert_eq!(config.encoder.device, "cuda:1");
    assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/fluency.log")));
}
