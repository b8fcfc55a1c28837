//! Tonal centroid features (tonnetz)
//!
//! Projects L1-normalised chroma onto three circles: fifths, minor thirds and
//! major thirds, each contributing an (x, y) pair.

use super::chroma::N_CHROMA;
use ndarray::Array2;

pub const N_TONNETZ: usize = 6;

/// Projection matrix, shape `(6, 12)`
pub fn tonnetz_basis() -> Array2<f64> {
    const SCALE: [f64; N_TONNETZ] = [7.0 / 6.0, 7.0 / 6.0, 1.5, 1.5, 2.0 / 3.0, 2.0 / 3.0];
    const RADIUS: [f64; N_TONNETZ] = [1.0, 1.0, 1.0, 1.0, 0.5, 0.5];

    Array2::from_shape_fn((N_TONNETZ, N_CHROMA), |(r, c)| {
        let mut v = SCALE[r] * c as f64;
        // Even rows are the sine (phase-shifted cosine) component
        if r % 2 == 0 {
            v -= 0.5;
        }
        RADIUS[r] * (std::f64::consts::PI * v).cos()
    })
}

/// Tonnetz, shape `(6, frames)`, from a chromagram
pub fn tonnetz(chroma: &Array2<f64>) -> Array2<f64> {
    let mut normalized = chroma.clone();
    for mut column in normalized.columns_mut() {
        let sum: f64 = column.iter().map(|v| v.abs()).sum();
        if sum > f64::MIN_POSITIVE {
            column.mapv_inplace(|v| v / sum);
        }
    }
    tonnetz_basis().dot(&normalized)
}
