//! Harmonic/percussive separation by median filtering
//!
//! Harmonic energy is smooth along time, percussive energy is smooth along
//! frequency. Median-filtering the magnitude spectrogram in each direction
//! gives two estimates; a Wiener-style soft mask keeps the harmonic share.

use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis};

/// Median filter length in both directions
pub const KERNEL_SIZE: usize = 31;
const MASK_POWER: i32 = 2;

/// Magnitude spectrogram of the harmonic component
pub fn harmonic_magnitude(magnitude: &Array2<f64>) -> Array2<f64> {
    let harmonic = median_filter(magnitude, Axis(1), KERNEL_SIZE);
    let percussive = median_filter(magnitude, Axis(0), KERNEL_SIZE);

    let mut out = magnitude.clone();
    ndarray::Zip::from(&mut out)
        .and(&harmonic)
        .and(&percussive)
        .for_each(|m, &h, &p| *m *= soft_mask(h, p));
    out
}

/// `h^2 / (h^2 + p^2)`, 0 where both estimates vanish
fn soft_mask(h: f64, p: f64) -> f64 {
    let z = h.max(p);
    if z < f64::MIN_POSITIVE {
        return 0.0;
    }
    let mh = (h / z).powi(MASK_POWER);
    let mp = (p / z).powi(MASK_POWER);
    mh / (mh + mp)
}

/// Sliding median along one axis with symmetric (edge-repeating) reflection
pub fn median_filter(input: &Array2<f64>, axis: Axis, size: usize) -> Array2<f64> {
    let mut out = Array2::zeros(input.raw_dim());
    let mut window = Vec::with_capacity(size);
    for (lane, out_lane) in input.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        median_lane(lane, out_lane, size, &mut window);
    }
    out
}

fn median_lane(
    lane: ArrayView1<f64>,
    mut out: ArrayViewMut1<f64>,
    size: usize,
    window: &mut Vec<f64>,
) {
    let n = lane.len();
    if n == 0 {
        return;
    }
    let half = (size / 2) as isize;
    for i in 0..n {
        window.clear();
        for offset in -half..=half {
            window.push(lane[reflect_index(i as isize + offset, n)]);
        }
        let mid = window.len() / 2;
        let (_, median, _) = window.select_nth_unstable_by(mid, f64::total_cmp);
        out[i] = *median;
    }
}

/// Map an out-of-range index into `0..n` by half-sample symmetric reflection
/// (`d c b a | a b c d | d c b a`)
fn reflect_index(idx: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let mut i = idx.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(2, 4), 2);
        // Window wider than the lane still lands in range
        assert_eq!(reflect_index(-9, 4), 0);
    }

    #[test]
    fn test_median_removes_impulse() {
        let mut input = Array2::zeros((1, 9));
        input[[0, 4]] = 10.0;
        let out = median_filter(&input, Axis(1), 3);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sustained_tone_is_harmonic() {
        // A horizontal line (constant bin over time) survives the harmonic mask
        let mut magnitude = Array2::zeros((64, 64));
        for t in 0..64 {
            magnitude[[20, t]] = 1.0;
        }
        let harmonic = harmonic_magnitude(&magnitude);
        assert!((harmonic[[20, 32]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_click_is_percussive() {
        // A vertical line (all bins in one frame) is removed
        let mut magnitude = Array2::zeros((64, 64));
        for f in 0..64 {
            magnitude[[f, 10]] = 1.0;
        }
        let harmonic = harmonic_magnitude(&magnitude);
        assert!(harmonic[[32, 10]].abs() < 1e-12);
    }
}
