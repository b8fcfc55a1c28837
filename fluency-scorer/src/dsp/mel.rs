//! Mel filterbank, decibel scaling and cepstral coefficients
//!
//! Slaney-style mel scale (linear below 1 kHz, logarithmic above) with
//! area-normalised triangular filters.

use ndarray::Array2;

/// Mel bands used for MFCC and onset analysis
pub const N_MELS: usize = 128;

/// Cepstral coefficients kept
pub const N_MFCC: usize = 20;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Triangular mel filterbank, shape `(n_mels, n_fft / 2 + 1)`, spanning
/// 0 Hz to Nyquist
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f64> {
    let n_bins = n_fft / 2 + 1;
    let fmax = sample_rate as f64 / 2.0;

    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| k as f64 * fmax / (n_bins - 1) as f64)
        .collect();

    let mel_max = hz_to_mel(fmax);
    let mel_f: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
        .collect();

    let mut weights = Array2::zeros((n_mels, n_bins));
    for m in 0..n_mels {
        let lower_width = mel_f[m + 1] - mel_f[m];
        let upper_width = mel_f[m + 2] - mel_f[m + 1];
        let enorm = 2.0 / (mel_f[m + 2] - mel_f[m]);
        for (k, &f) in fft_freqs.iter().enumerate() {
            let lower = (f - mel_f[m]) / lower_width;
            let upper = (mel_f[m + 2] - f) / upper_width;
            weights[[m, k]] = lower.min(upper).max(0.0) * enorm;
        }
    }
    weights
}

/// Power spectrogram (`|STFT|^2`) projected onto mel bands
pub fn mel_power_spectrogram(magnitude: &Array2<f64>, filterbank: &Array2<f64>) -> Array2<f64> {
    let power = magnitude.mapv(|m| m * m);
    filterbank.dot(&power)
}

/// `10 log10(S)` with a floor of `amin` and an 80 dB dynamic range cap
/// relative to the array maximum
pub fn power_to_db(power: &Array2<f64>) -> Array2<f64> {
    const AMIN: f64 = 1e-10;
    const TOP_DB: f64 = 80.0;

    let mut db = power.mapv(|p| 10.0 * p.max(AMIN).log10());
    let max = db.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_finite() {
        let floor = max - TOP_DB;
        db.mapv_inplace(|v| v.max(floor));
    }
    db
}

/// Orthonormal DCT-II basis, shape `(n_out, n_in)`
pub fn dct_basis(n_out: usize, n_in: usize) -> Array2<f64> {
    let n = n_in as f64;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        scale * (std::f64::consts::PI / n * (i as f64 + 0.5) * k as f64).cos()
    })
}

/// MFCC matrix, shape `(N_MFCC, frames)`, from a mel power spectrogram
pub fn mfcc(mel_power: &Array2<f64>) -> Array2<f64> {
    let log_mel = power_to_db(mel_power);
    dct_basis(N_MFCC, log_mel.shape()[0]).dot(&log_mel)
}
