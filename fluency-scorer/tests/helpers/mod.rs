//! Test Helper Utilities
//!
//! Shared utilities for testing fluency-scorer

#![allow(dead_code)]

pub mod audio_generator;

// Re-export commonly used items; each test binary uses its own subset
#[allow(unused_imports)]
pub use audio_generator::{
    generate_corrupt_file, generate_empty_wav, generate_test_wav, generate_zero_byte_file,
    AudioConfig,
};

use fluency_common::config::ScorerConfig;
use fluency_scorer::extractors::{AudioEncoder, SharedEncoder};
use fluency_scorer::{Result, ScorerError};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Deterministic stand-in for the pretrained encoder
///
/// Input arrives normalised to unit variance, so amplitude is gone; the
/// zero-crossing rate (i.e. pitch) survives and leads the vector.
pub struct MockEncoder {
    pub dim: usize,
}

impl AudioEncoder for MockEncoder {
    fn encode(&self, samples: &[f32]) -> Result<Vec<f32>> {
        if samples.is_empty() {
            return Err(ScorerError::Encoder("empty input".to_string()));
        }
        let n = samples.len() as f32;
        let crossings = samples
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count() as f32;
        let zcr = crossings / n;
        let mean_abs = samples.iter().map(|s| s.abs()).sum::<f32>() / n;

        let mut v = vec![0.0f32; self.dim];
        v[0] = zcr * 100.0;
        if self.dim > 1 {
            v[1] = mean_abs;
        }
        for (k, slot) in v.iter_mut().enumerate().skip(2) {
            *slot = (k as f32 * zcr * 10.0).sin();
        }
        Ok(v)
    }

    fn hidden_size(&self) -> Option<usize> {
        Some(self.dim)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Encoder whose output width depends on the input length
pub struct UnstableEncoder;

impl AudioEncoder for UnstableEncoder {
    fn encode(&self, samples: &[f32]) -> Result<Vec<f32>> {
        Ok(vec![1.0; 2 + samples.len() % 3])
    }

    fn name(&self) -> &str {
        "unstable"
    }
}

pub fn mock_encoder(dim: usize) -> SharedEncoder {
    SharedEncoder::from_encoder(Arc::new(MockEncoder { dim }))
}

/// Label of the i-th training clip, spread over [1, 4]
pub fn label_for(i: usize, n: usize) -> f64 {
    1.0 + 3.0 * ((i * 37) % n) as f64 / (n - 1).max(1) as f64
}

/// Pitch and loudness both rise with the label
pub fn clip_config(label: f64) -> AudioConfig {
    AudioConfig {
        frequency: 200.0 + 100.0 * label as f32,
        amplitude: 0.05 + 0.1 * label as f32,
        ..AudioConfig::default()
    }
}

/// Temp workspace with train/test audio, both index files and a config
/// pointing at them
pub struct DatasetFixture {
    pub dir: TempDir,
    pub config: ScorerConfig,
    pub train_labels: Vec<f64>,
    pub test_ids: Vec<String>,
}

impl DatasetFixture {
    pub fn new(n_train: usize, n_test: usize) -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        let root = dir.path();
        let train_dir = root.join("train");
        let test_dir = root.join("test");
        std::fs::create_dir_all(&train_dir)?;
        std::fs::create_dir_all(&test_dir)?;

        let mut train_csv = String::from("filename,label,speaker\n");
        let mut train_labels = Vec::with_capacity(n_train);
        for i in 0..n_train {
            let label = label_for(i, n_train);
            let name = format!("train_{:03}.wav", i);
            generate_test_wav(&train_dir.join(&name), &clip_config(label))?;
            train_csv.push_str(&format!("{},{},spk{}\n", name, label, i % 4));
            train_labels.push(label);
        }
        std::fs::write(root.join("train.csv"), train_csv)?;

        let mut test_csv = String::from("filename\n");
        let mut test_ids = Vec::with_capacity(n_test);
        for i in 0..n_test {
            let name = format!("test_{:03}.wav", i);
            let label = 1.0 + 3.0 * i as f64 / (n_test.max(2) - 1) as f64;
            generate_test_wav(&test_dir.join(&name), &clip_config(label))?;
            test_csv.push_str(&format!("{}\n", name));
            test_ids.push(name);
        }
        std::fs::write(root.join("test.csv"), test_csv)?;

        let mut config = ScorerConfig::default();
        config.dataset.train_index = root.join("train.csv");
        config.dataset.test_index = root.join("test.csv");
        config.dataset.train_audio_dir = train_dir;
        config.dataset.test_audio_dir = test_dir;
        config.dataset.output = root.join("out").join("submission.csv");
        config.artifacts.dir = root.join("models");
        config.extraction.workers = Some(4);

        Ok(Self {
            dir,
            config,
            train_labels,
            test_ids,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Append an extra test row pointing at `name` (file created by caller)
    pub fn add_test_row(&mut self, name: &str) -> anyhow::Result<()> {
        let index = &self.config.dataset.test_index;
        let mut content = std::fs::read_to_string(index)?;
        content.push_str(&format!("{}\n", name));
        std::fs::write(index, content)?;
        self.test_ids.push(name.to_string());
        Ok(())
    }
}
