//! Global tempo estimate
//!
//! 1. Onset strength: positive first difference of the dB mel spectrogram,
//!    averaged over bands
//! 2. Tempogram: windowed autocorrelation of the onset envelope around every
//!    frame, each frame normalised to its zero-lag value
//! 3. Pick the lag maximising `log1p(1e6 * mean_autocorr) + log_prior`, with a
//!    log-normal prior around [`START_BPM`]

use super::mel::power_to_db;
use super::stft::hann_window;
use ndarray::Array2;

const START_BPM: f64 = 120.0;
/// Prior width in octaves
const STD_BPM: f64 = 1.0;
const MAX_TEMPO: f64 = 320.0;
/// Autocorrelation window, seconds
const AC_SIZE: f64 = 8.0;

/// Onset strength envelope, one value per spectrogram frame
pub fn onset_strength(mel_power: &Array2<f64>, n_fft: usize, hop_length: usize) -> Vec<f64> {
    let db = power_to_db(mel_power);
    let (n_bands, n_frames) = (db.shape()[0], db.shape()[1]);
    if n_frames < 2 || n_bands == 0 {
        return vec![0.0; n_frames];
    }

    let flux: Vec<f64> = (1..n_frames)
        .map(|t| {
            let rise: f64 = (0..n_bands)
                .map(|b| (db[[b, t]] - db[[b, t - 1]]).max(0.0))
                .sum();
            rise / n_bands as f64
        })
        .collect();

    // Shift right by the lag plus the centering offset, keep the frame count
    let offset = 1 + n_fft / (2 * hop_length);
    let mut envelope = vec![0.0; offset.min(n_frames)];
    envelope.extend(flux.into_iter().take(n_frames.saturating_sub(offset)));
    envelope
}

/// Tempo in beats per minute; 0 when the envelope carries no onsets
pub fn estimate_tempo(onset_envelope: &[f64], sample_rate: u32, hop_length: usize) -> f64 {
    if onset_envelope.iter().all(|&v| v == 0.0) {
        return 0.0;
    }

    let win_length = (AC_SIZE * sample_rate as f64 / hop_length as f64).floor() as usize;
    if win_length < 2 {
        return 0.0;
    }

    let mean_ac = mean_tempogram(onset_envelope, win_length);

    let frame_rate = sample_rate as f64 / hop_length as f64;
    let mut best: Option<(usize, f64)> = None;
    for (lag, &ac) in mean_ac.iter().enumerate().skip(1) {
        let bpm = 60.0 * frame_rate / lag as f64;
        if bpm >= MAX_TEMPO {
            continue;
        }
        let log_prior = -0.5 * ((bpm.log2() - START_BPM.log2()) / STD_BPM).powi(2);
        let score = (1e6 * ac).ln_1p() + log_prior;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((lag, score));
        }
    }

    best.map_or(0.0, |(lag, _)| 60.0 * frame_rate / lag as f64)
}

/// Mean over frames of the per-frame normalised local autocorrelation
fn mean_tempogram(envelope: &[f64], win_length: usize) -> Vec<f64> {
    let n = envelope.len();
    let pad = win_length / 2;
    let padded = ramp_pad(envelope, pad);
    let window = hann_window(win_length);

    let mut sum = vec![0.0; win_length];
    let mut segment = vec![0.0; win_length];
    let n_frames = n.min(padded.len().saturating_sub(win_length) + 1);

    for t in 0..n_frames {
        for (i, slot) in segment.iter_mut().enumerate() {
            *slot = padded[t + i] * window[i];
        }
        let zero_lag: f64 = segment.iter().map(|v| v * v).sum();
        if zero_lag <= f64::MIN_POSITIVE {
            continue;
        }
        for (lag, acc) in sum.iter_mut().enumerate() {
            let r: f64 = segment[..win_length - lag]
                .iter()
                .zip(&segment[lag..])
                .map(|(a, b)| a * b)
                .sum();
            *acc += r / zero_lag;
        }
    }

    if n_frames > 0 {
        for v in sum.iter_mut() {
            *v /= n_frames as f64;
        }
    }
    sum
}

/// Pad both ends with a linear ramp from 0 up to the edge value
fn ramp_pad(envelope: &[f64], pad: usize) -> Vec<f64> {
    let first = envelope.first().copied().unwrap_or(0.0);
    let last = envelope.last().copied().unwrap_or(0.0);

    let mut out = Vec::with_capacity(envelope.len() + 2 * pad);
    out.extend((0..pad).map(|i| first * i as f64 / pad as f64));
    out.extend_from_slice(envelope);
    out.extend((1..=pad).map(|d| last * (pad - d) as f64 / pad as f64));
    out
}
