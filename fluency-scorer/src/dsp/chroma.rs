//! Chromagram from a power spectrogram
//!
//! Each FFT bin contributes to the 12 pitch classes through a Gaussian bump
//! centred on its (fractional) pitch class, weighted towards the middle
//! octaves. Frames are normalised so their strongest pitch class is 1.

use ndarray::Array2;

pub const N_CHROMA: usize = 12;

/// Octave (relative to A0/16-ish reference) the weighting is centred on
const CENTER_OCTAVE: f64 = 5.0;
/// Gaussian half-width of the octave weighting, in octaves
const OCTAVE_WIDTH: f64 = 2.0;
const A440: f64 = 440.0;

/// Chroma filterbank, shape `(N_CHROMA, n_fft / 2 + 1)`, rows starting at C
pub fn chroma_filterbank(sample_rate: u32, n_fft: usize) -> Array2<f64> {
    let n_chroma = N_CHROMA as f64;

    // Fractional chroma bin of each FFT bin; DC gets a value 1.5 octaves
    // below bin 1 so it does not alias onto a real pitch.
    let mut frq_bins = Vec::with_capacity(n_fft);
    for k in 1..n_fft {
        let freq = k as f64 * sample_rate as f64 / n_fft as f64;
        frq_bins.push(n_chroma * (freq / (A440 / 16.0)).log2());
    }
    frq_bins.insert(0, frq_bins[0] - 1.5 * n_chroma);

    let mut bin_widths: Vec<f64> = frq_bins.windows(2).map(|w| (w[1] - w[0]).max(1.0)).collect();
    bin_widths.push(1.0);

    let half = (n_chroma / 2.0).round();
    let mut weights = Array2::zeros((N_CHROMA, n_fft));
    for (k, (&fb, &width)) in frq_bins.iter().zip(&bin_widths).enumerate() {
        for c in 0..N_CHROMA {
            let d = (fb - c as f64 + half + 10.0 * n_chroma).rem_euclid(n_chroma) - half;
            weights[[c, k]] = (-0.5 * (2.0 * d / width).powi(2)).exp();
        }
    }

    // Unit L2 norm per FFT bin, then octave emphasis
    for (k, &fb) in frq_bins.iter().enumerate() {
        let mut column = weights.column_mut(k);
        let norm = column.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > f64::MIN_POSITIVE {
            column.mapv_inplace(|w| w / norm);
        }
        let octave_weight =
            (-0.5 * ((fb / n_chroma - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
        column.mapv_inplace(|w| w * octave_weight);
    }

    // Rotate so row 0 is C (the bins above are A-based), keep positive freqs
    let n_bins = n_fft / 2 + 1;
    Array2::from_shape_fn((N_CHROMA, n_bins), |(c, k)| weights[[(c + 3) % N_CHROMA, k]])
}

/// Chromagram, shape `(N_CHROMA, frames)`
pub fn chromagram(power: &Array2<f64>, filterbank: &Array2<f64>) -> Array2<f64> {
    let mut chroma = filterbank.dot(power);
    normalize_columns_max(&mut chroma);
    chroma
}

/// Divide every column by its largest absolute value (silent columns untouched)
pub fn normalize_columns_max(matrix: &mut Array2<f64>) {
    for mut column in matrix.columns_mut() {
        let max = column.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if max > f64::MIN_POSITIVE {
            column.mapv_inplace(|v| v / max);
        }
    }
}
