//! Mono resampling using rubato
//!
//! Every waveform is analysed at one rate (16 kHz by default), regardless of
//! the rate it was recorded at.

use crate::error::ExtractionError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Sinc filter length in input frames
const SINC_LEN: usize = 256;

/// Resample mono PCM from `source_rate` to `target_rate`
///
/// Returns the input unchanged when the rates already match. The output is
/// aligned with the input (filter delay removed) and holds
/// `ceil(len * target_rate / source_rate)` frames.
///
/// # Algorithm
/// - Sinc interpolation with BlackmanHarris2 window
/// - 256-tap filter, 0.95 cutoff to prevent aliasing
/// - Single pass over the input plus one filter length of zeros, so the
///   delayed tail is flushed out
pub fn resample_mono(
    mut samples: Vec<f32>,
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, ExtractionError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples);
    }
    if source_rate == 0 {
        return Err(ExtractionError::Resample("source rate is zero".to_string()));
    }

    let num_frames = samples.len();
    let ratio = target_rate as f64 / source_rate as f64;
    let expected_len = (num_frames as u64 * target_rate as u64).div_ceil(source_rate as u64) as usize;

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    samples.resize(num_frames + SINC_LEN, 0.0);
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, samples.len(), 1)
        .map_err(|e| ExtractionError::Resample(format!("create resampler: {}", e)))?;
    let delay = resampler.output_delay();

    let output = resampler
        .process(&[samples], None)
        .map_err(|e| ExtractionError::Resample(e.to_string()))?;

    let resampled: Vec<f32> = output
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .skip(delay)
        .take(expected_len)
        .collect();

    debug!(
        "Resampled {} frames ({} Hz) -> {} frames ({} Hz), {} frames of filter delay removed",
        num_frames,
        source_rate,
        resampled.len(),
        target_rate,
        delay
    );

    Ok(resampled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_passthrough() {
        let input = vec![0.1, -0.2, 0.3];
        let out = resample_mono(input.clone(), 16_000, 16_000).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_downsample_length() {
        let input: Vec<f32> = (0..44_100)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44_100.0).sin())
            .collect();
        let out = resample_mono(input, 44_100, 16_000).unwrap();

        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn test_output_is_aligned_with_input() {
        // Impulse half a second in must stay half a second in
        let mut input = vec![0.0f32; 44_100];
        input[22_050] = 1.0;
        let out = resample_mono(input, 44_100, 16_000).unwrap();

        let peak = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!((peak as i64 - 8_000).abs() <= 1, "peak at {}", peak);
    }

    #[test]
    fn test_upsample_keeps_tail() {
        let input = vec![0.5f32; 8_000];
        let out = resample_mono(input, 8_000, 16_000).unwrap();
        assert_eq!(out.len(), 16_000);
        // Constant level holds through the end once the delay is trimmed
        assert!(out[15_000..15_700].iter().all(|v| (v - 0.5).abs() < 0.05));
    }
}
