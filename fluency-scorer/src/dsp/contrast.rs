//! Spectral contrast: peak-to-valley energy difference per octave band

use super::mel::power_to_db;
use ndarray::Array2;

/// Octave bands above `CONTRAST_FMIN`; one extra band collects the rest
pub const N_BANDS: usize = 6;
const CONTRAST_FMIN: f64 = 200.0;
const QUANTILE: f64 = 0.02;

/// Spectral contrast, shape `(N_BANDS + 1, frames)`, in dB
///
/// `frequencies` are the FFT bin centers of `magnitude`'s rows.
pub fn spectral_contrast(magnitude: &Array2<f64>, frequencies: &[f64]) -> Array2<f64> {
    let n_frames = magnitude.shape()[1];
    let n_bins = frequencies.len();

    // Band edges: 0, fmin, 2 fmin, 4 fmin, ...
    let mut edges = vec![0.0];
    edges.extend((0..=N_BANDS).map(|i| CONTRAST_FMIN * 2f64.powi(i as i32)));

    let mut valley = Array2::zeros((N_BANDS + 1, n_frames));
    let mut peak = Array2::zeros((N_BANDS + 1, n_frames));
    let mut scratch = Vec::new();

    for k in 0..=N_BANDS {
        let (f_low, f_high) = (edges[k], edges[k + 1]);
        let in_band: Vec<usize> = (0..n_bins)
            .filter(|&b| frequencies[b] >= f_low && frequencies[b] <= f_high)
            .collect();
        let (Some(&first), Some(&last)) = (in_band.first(), in_band.last()) else {
            continue;
        };

        // Lower neighbour joins every band but the first; the top band runs
        // to Nyquist.
        let mut start = first;
        if k > 0 && first > 0 {
            start = first - 1;
        }
        let mut end = last + 1;
        if k == N_BANDS {
            end = n_bins;
        }
        let band_size = end - start;
        // All but the top band drop their highest bin
        let used_end = if k < N_BANDS { end - 1 } else { end };

        let take = ((QUANTILE * band_size as f64).round() as usize).max(1);

        for t in 0..n_frames {
            scratch.clear();
            scratch.extend((start..used_end).map(|b| magnitude[[b, t]]));
            if scratch.is_empty() {
                continue;
            }
            scratch.sort_by(f64::total_cmp);
            let take = take.min(scratch.len());
            valley[[k, t]] = scratch[..take].iter().sum::<f64>() / take as f64;
            peak[[k, t]] = scratch[scratch.len() - take..].iter().sum::<f64>() / take as f64;
        }
    }

    power_to_db(&peak) - power_to_db(&valley)
}
