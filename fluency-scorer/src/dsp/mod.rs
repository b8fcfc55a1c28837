//! Spectral and temporal analysis primitives
//!
//! Everything operates on `f64` spectrogram matrices shaped `(rows, frames)`
//! produced by [`stft::stft_magnitude`] with the shared framing constants.

pub mod chroma;
pub mod contrast;
pub mod hpss;
pub mod mel;
pub mod stft;
pub mod tempo;
pub mod temporal;
pub mod tonnetz;

/// Mean and population standard deviation over every element
///
/// Returns `(0.0, 0.0)` for an empty input.
pub fn mean_std<'a, I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = &'a f64>,
    I::IntoIter: Clone,
{
    let iter = values.into_iter();
    let (count, sum) = iter.clone().fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if count == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / count as f64;
    let var = iter.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    (mean, var.sqrt())
}
