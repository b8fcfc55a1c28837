//! Audio Test Fixture Generator
//!
//! Tone WAV files plus a few broken inputs

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub frequency: f32,
    pub amplitude: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 1.0,
            sample_rate: 16_000,
            channels: 1,
            frequency: 440.0,
            amplitude: 0.3,
        }
    }
}

/// Generate a 16-bit PCM sine WAV
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let value = config.amplitude * (2.0 * std::f32::consts::PI * config.frequency * t).sin();
        let sample = (value * i16::MAX as f32) as i16;
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Valid WAV header, zero frames
pub fn generate_empty_wav(path: &Path) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    hound::WavWriter::create(path, spec)?.finalize()?;
    Ok(path.to_path_buf())
}

/// Bytes that no decoder accepts
pub fn generate_corrupt_file(path: &Path) -> anyhow::Result<PathBuf> {
    std::fs::write(path, b"this is not audio at all, just some text bytes")?;
    Ok(path.to_path_buf())
}

/// Zero-byte file
pub fn generate_zero_byte_file(path: &Path) -> anyhow::Result<PathBuf> {
    std::fs::write(path, b"")?;
    Ok(path.to_path_buf())
}
