//! Framing and short-time Fourier transform
//!
//! All frame-based series share one geometry: centered frames of
//! [`N_FFT`] samples every [`HOP_LENGTH`] samples, so an `n`-sample signal
//! yields `1 + n / HOP_LENGTH` frames in every series.

use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};

/// FFT size / analysis frame length
pub const N_FFT: usize = 2048;

/// Hop between consecutive frames
pub const HOP_LENGTH: usize = 512;

/// Periodic Hann window of length `n`
pub fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos())
        .collect()
}

/// How signal edges are extended before centered framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadMode {
    /// Zeros on both sides
    Constant,
    /// Repeat the first/last sample
    Edge,
}

/// Pad `frame_length / 2` samples on each side so frame `t` is centered on
/// sample `t * hop`
pub fn center_pad(signal: &[f32], frame_length: usize, mode: PadMode) -> Vec<f64> {
    let pad = frame_length / 2;
    let (left, right) = match mode {
        PadMode::Constant => (0.0, 0.0),
        PadMode::Edge => (
            signal.first().map_or(0.0, |&s| f64::from(s)),
            signal.last().map_or(0.0, |&s| f64::from(s)),
        ),
    };

    let mut padded = Vec::with_capacity(signal.len() + 2 * pad);
    padded.resize(pad, left);
    padded.extend(signal.iter().map(|&s| f64::from(s)));
    padded.resize(signal.len() + 2 * pad, right);
    padded
}

/// Number of full frames in a buffer
pub fn frame_count(len: usize, frame_length: usize, hop_length: usize) -> usize {
    if len < frame_length {
        0
    } else {
        1 + (len - frame_length) / hop_length
    }
}

/// Iterate full frames of a padded buffer
pub fn frames(
    padded: &[f64],
    frame_length: usize,
    hop_length: usize,
) -> impl Iterator<Item = &[f64]> {
    let count = frame_count(padded.len(), frame_length, hop_length);
    (0..count).map(move |t| &padded[t * hop_length..t * hop_length + frame_length])
}

/// Magnitude spectrogram, shape `(N_FFT / 2 + 1, frames)`
pub fn stft_magnitude(signal: &[f32], n_fft: usize, hop_length: usize) -> Array2<f64> {
    let padded = center_pad(signal, n_fft, PadMode::Constant);
    let n_frames = frame_count(padded.len(), n_fft, hop_length);
    let n_bins = n_fft / 2 + 1;
    let window = hann_window(n_fft);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];

    let mut out = Array2::zeros((n_bins, n_frames));
    for (t, frame) in frames(&padded, n_fft, hop_length).enumerate() {
        for ((slot, &x), &w) in buffer.iter_mut().zip(frame).zip(&window) {
            *slot = Complex::new(x * w, 0.0);
        }
        fft.process(&mut buffer);
        for k in 0..n_bins {
            out[[k, t]] = buffer[k].norm();
        }
    }
    out
}

/// Center frequency of each FFT bin
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    let n_bins = n_fft / 2 + 1;
    (0..n_bins)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect()
}
