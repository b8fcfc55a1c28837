//! Handcrafted acoustic descriptor
//!
//! Thirteen whole-signal statistics computed from one shared STFT:
//! MFCC, chroma, zero-crossing rate, RMS, spectral contrast and tonnetz
//! (mean and standard deviation of each), followed by the global tempo.
//!
//! Filterbanks depend only on the sample rate and are built once per
//! extractor, so a single instance can be shared across a rayon pool.

use crate::audio::{load_waveform, Waveform};
use crate::dsp::{chroma, contrast, hpss, mean_std, mel, stft, tempo, temporal, tonnetz};
use crate::error::ExtractionError;
use crate::types::{HandcraftedVector, HANDCRAFTED_DIM, HANDCRAFTED_FEATURE_NAMES};
use ndarray::Array2;
use std::path::Path;

/// Waveform → 13 classical acoustic statistics
pub struct HandcraftedFeatureExtractor {
    sample_rate: u32,
    mel_filterbank: Array2<f64>,
    chroma_filterbank: Array2<f64>,
    frequencies: Vec<f64>,
}

impl Default for HandcraftedFeatureExtractor {
    fn default() -> Self {
        Self::new(16_000)
    }
}

impl HandcraftedFeatureExtractor {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            mel_filterbank: mel::mel_filterbank(sample_rate, stft::N_FFT, mel::N_MELS),
            chroma_filterbank: chroma::chroma_filterbank(sample_rate, stft::N_FFT),
            frequencies: stft::fft_frequencies(sample_rate, stft::N_FFT),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decode `path` and compute its descriptor
    pub fn extract(&self, path: &Path) -> Result<HandcraftedVector, ExtractionError> {
        let waveform = load_waveform(path, self.sample_rate)?;
        self.extract_from_waveform(&waveform)
    }

    /// Like [`extract`](Self::extract), but any failure becomes the all-zero
    /// sentinel (logged at WARN) so a batch keeps going
    pub fn extract_or_sentinel(&self, path: &Path) -> HandcraftedVector {
        match self.extract(path) {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Handcrafted extraction failed, substituting zero vector"
                );
                HandcraftedVector::SENTINEL
            }
        }
    }

    /// Compute the descriptor of an already-loaded waveform
    pub fn extract_from_waveform(
        &self,
        waveform: &Waveform,
    ) -> Result<HandcraftedVector, ExtractionError> {
        if waveform.samples.is_empty() {
            return Err(ExtractionError::DegenerateSignal("empty waveform".to_string()));
        }
        if waveform.sample_rate != self.sample_rate {
            return Err(ExtractionError::DegenerateSignal(format!(
                "waveform at {} Hz, extractor expects {} Hz",
                waveform.sample_rate, self.sample_rate
            )));
        }

        let signal = &waveform.samples;
        let magnitude = stft::stft_magnitude(signal, stft::N_FFT, stft::HOP_LENGTH);
        let power = magnitude.mapv(|m| m * m);

        let mel_power = mel::mel_power_spectrogram(&magnitude, &self.mel_filterbank);
        let (mfcc_mean, mfcc_std) = mean_std(mel::mfcc(&mel_power).iter());

        let chromagram = chroma::chromagram(&power, &self.chroma_filterbank);
        let (chroma_mean, chroma_std) = mean_std(chromagram.iter());

        let (zcr_mean, zcr_std) =
            mean_std(&temporal::zero_crossing_rate(signal, stft::N_FFT, stft::HOP_LENGTH));
        let (rms_mean, rms_std) = mean_std(&temporal::rms(signal, stft::N_FFT, stft::HOP_LENGTH));

        let spectral_contrast = contrast::spectral_contrast(&magnitude, &self.frequencies);
        let (contrast_mean, contrast_std) = mean_std(spectral_contrast.iter());

        let harmonic = hpss::harmonic_magnitude(&magnitude);
        let harmonic_chroma =
            chroma::chromagram(&harmonic.mapv(|m| m * m), &self.chroma_filterbank);
        let (tonnetz_mean, tonnetz_std) = mean_std(tonnetz::tonnetz(&harmonic_chroma).iter());

        let onset_envelope = tempo::onset_strength(&mel_power, stft::N_FFT, stft::HOP_LENGTH);
        let bpm = tempo::estimate_tempo(&onset_envelope, self.sample_rate, stft::HOP_LENGTH);

        let values: [f64; HANDCRAFTED_DIM] = [
            mfcc_mean,
            mfcc_std,
            chroma_mean,
            chroma_std,
            zcr_mean,
            zcr_std,
            rms_mean,
            rms_std,
            contrast_mean,
            contrast_std,
            tonnetz_mean,
            tonnetz_std,
            bpm,
        ];

        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ExtractionError::NonFinite(HANDCRAFTED_FEATURE_NAMES[i].to_string()));
        }

        tracing::debug!(
            duration_s = waveform.duration_seconds(),
            frames = magnitude.shape()[1],
            tempo = bpm,
            "Handcrafted features computed"
        );

        Ok(HandcraftedVector(values))
    }
}
