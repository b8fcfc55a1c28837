//! Time-domain frame series: zero-crossing rate and RMS energy

use super::stft::{center_pad, frames, PadMode};

/// Magnitudes at or below this are treated as exact zeros
const ZERO_THRESHOLD: f64 = 1e-10;

/// Fraction of sign changes per frame (zero counts as positive)
pub fn zero_crossing_rate(signal: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    let padded = center_pad(signal, frame_length, PadMode::Edge);
    frames(&padded, frame_length, hop_length)
        .map(|frame| {
            let negative = |x: f64| x.abs() > ZERO_THRESHOLD && x < 0.0;
            let crossings = frame
                .windows(2)
                .filter(|w| negative(w[0]) != negative(w[1]))
                .count();
            crossings as f64 / frame_length as f64
        })
        .collect()
}

/// Root-mean-square amplitude per frame
pub fn rms(signal: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    let padded = center_pad(signal, frame_length, PadMode::Constant);
    frames(&padded, frame_length, hop_length)
        .map(|frame| {
            let power = frame.iter().map(|x| x * x).sum::<f64>() / frame_length as f64;
            power.sqrt()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::stft::{HOP_LENGTH, N_FFT};

    fn sine(freq: f32, sr: u32, amplitude: f32) -> Vec<f32> {
        (0..sr)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn test_series_length_matches_stft_frames() {
        let signal = sine(220.0, 16_000, 0.5);
        assert_eq!(zero_crossing_rate(&signal, N_FFT, HOP_LENGTH).len(), 1 + 16_000 / HOP_LENGTH);
        assert_eq!(rms(&signal, N_FFT, HOP_LENGTH).len(), 1 + 16_000 / HOP_LENGTH);
    }

    #[test]
    fn test_zcr_tracks_frequency() {
        let sr = 16_000;
        let zcr = zero_crossing_rate(&sine(1000.0, sr, 0.5), N_FFT, HOP_LENGTH);
        let mid = zcr[zcr.len() / 2];
        // 2 crossings per cycle -> 2000 per second -> 0.125 per sample
        assert!((mid - 0.125).abs() < 0.01, "zcr {}", mid);
    }

    #[test]
    fn test_rms_of_sine() {
        let values = rms(&sine(440.0, 16_000, 0.5), N_FFT, HOP_LENGTH);
        let mid = values[values.len() / 2];
        assert!((mid - 0.5 / 2f64.sqrt()).abs() < 0.01);
    }

    #[test]
    fn test_silence_has_no_crossings() {
        let silence = vec![0.0f32; 8000];
        assert!(zero_crossing_rate(&silence, N_FFT, HOP_LENGTH)
            .iter()
            .all(|&z| z == 0.0));
    }
}
