//! Waveform loading: decode, down-mix, resample, sanity-check

pub mod decoder;
pub mod resampler;

pub use decoder::{decode_audio_file, DecodedAudio};
pub use resampler::resample_mono;

use crate::error::ExtractionError;
use std::path::Path;

/// Mono waveform at the analysis rate
#[derive(Debug, Clone)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Load a file as mono PCM at `target_rate`
///
/// Fails on decode errors, empty audio and non-finite samples, so analysis
/// code downstream can assume a finite, non-empty signal.
pub fn load_waveform(path: &Path, target_rate: u32) -> Result<Waveform, ExtractionError> {
    let decoded = decode_audio_file(path)?;
    if decoded.samples.is_empty() {
        return Err(ExtractionError::DegenerateSignal(format!(
            "{} contains no audio frames",
            path.display()
        )));
    }

    let samples = resample_mono(decoded.samples, decoded.sample_rate, target_rate)?;
    if samples.is_empty() {
        return Err(ExtractionError::DegenerateSignal(format!(
            "{} is empty after resampling",
            path.display()
        )));
    }
    if samples.iter().any(|s| !s.is_finite()) {
        return Err(ExtractionError::NonFinite(format!("waveform of {}", path.display())));
    }

    Ok(Waveform {
        samples,
        sample_rate: target_rate,
    })
}
