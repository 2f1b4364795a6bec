//! Sample-rate conversion
//!
//! - [`resample`]: rate conversion with rubato (feature path 22.05 kHz, mastering path 48 kHz)
//! - [`oversample`]: polyphase windowed-sinc interpolation used for true-peak detection

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use std::f64::consts::PI;

use crate::error::AnalysisError;

/// Taps of the interpolation prototype filter per oversampling phase
const TAPS_PER_PHASE: usize = 16;

/// Kaiser window shape parameter for the interpolation filter
const KAISER_BETA: f64 = 8.6;

/// Convert mono samples from `input_rate` to `output_rate`
///
/// Returns a copy when the rates already match.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for zero rates and
/// `AnalysisError::ProcessingError` if rubato rejects the conversion.
pub fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>, AnalysisError> {
    if input_rate == 0 || output_rate == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid sample rates: {} -> {}",
            input_rate, output_rate
        )));
    }

    if input_rate == output_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    log::debug!(
        "Resampling {} samples from {}Hz to {}Hz",
        input.len(),
        input_rate,
        output_rate
    );

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input.len(),
        1,
    )
    .map_err(|e| AnalysisError::ProcessingError(format!("Failed to create resampler: {}", e)))?;

    let planar_input = vec![input.to_vec()];
    let mut planar_output = resampler
        .process(&planar_input, None)
        .map_err(|e| AnalysisError::ProcessingError(format!("Resampling failed: {}", e)))?;

    let output = planar_output.pop().unwrap_or_default();
    log::debug!("Resampled to {} samples", output.len());
    Ok(output)
}

/// Upsample by an integer `factor` with a Kaiser-windowed sinc interpolator
///
/// Inter-sample peaks of the band-limited signal appear in the output, which is
/// what true-peak measurement needs. The output is delayed by the filter's
/// group delay; sample alignment is irrelevant for peak search.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `factor` is 0.
pub fn oversample(input: &[f32], factor: usize) -> Result<Vec<f32>, AnalysisError> {
    if factor == 0 {
        return Err(AnalysisError::InvalidInput(
            "Oversampling factor must be > 0".to_string(),
        ));
    }
    if factor == 1 || input.is_empty() {
        return Ok(input.to_vec());
    }

    let coeffs = interpolation_filter(factor);
    let taps = coeffs.len();
    let out_len = input.len() * factor + taps - 1;
    let mut output = vec![0.0f32; out_len];

    // y[m] = factor * sum_k h[m - factor*k] * x[k]
    for (m, out) in output.iter_mut().enumerate() {
        let k_max = (m / factor).min(input.len() - 1);
        let k_min = if m + 1 > taps { (m + 1 - taps).div_ceil(factor) } else { 0 };
        if k_min > k_max {
            continue;
        }
        let mut acc = 0.0f64;
        for k in k_min..=k_max {
            acc += coeffs[m - factor * k] * input[k] as f64;
        }
        *out = (acc * factor as f64) as f32;
    }

    Ok(output)
}

/// Low-pass prototype at `0.5 / factor` of the oversampled rate, unity DC gain
fn interpolation_filter(factor: usize) -> Vec<f64> {
    let len = TAPS_PER_PHASE * factor;
    let m = (len - 1) as f64;
    let fc = 0.5 / factor as f64;
    let alpha = m / 2.0;

    let mut coeffs: Vec<f64> = (0..len)
        .map(|i| {
            let n = i as f64 - alpha;
            let sinc = if n.abs() < 1e-10 {
                2.0 * fc
            } else {
                (2.0 * PI * fc * n).sin() / (PI * n)
            };
            let arg = 1.0 - ((i as f64 - alpha) / alpha).powi(2);
            let window = if arg > 0.0 {
                bessel_i0(KAISER_BETA * arg.sqrt()) / bessel_i0(KAISER_BETA)
            } else {
                0.0
            };
            sinc * window
        })
        .collect();

    let sum: f64 = coeffs.iter().sum();
    if sum.abs() > 1e-12 {
        for c in &mut coeffs {
            *c /= sum;
        }
    }
    coeffs
}

/// Zeroth-order modified Bessel function of the first kind (power series)
fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..50 {
        term *= (half / k as f64).powi(2);
        sum += term;
        if term < 1e-12 * sum {
            break;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_copy() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&input, 44100, 44100).unwrap(), input);
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(resample(&[0.0], 0, 48000).is_err());
    }

    #[test]
    fn test_resample_length_ratio() {
        let input: Vec<f32> = (0..22050)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 22050.0).sin())
            .collect();
        let output = resample(&input, 22050, 44100).unwrap();
        let expected = 44100.0;
        assert!(
            (output.len() as f32 - expected).abs() / expected < 0.05,
            "expected ~{} samples, got {}",
            expected,
            output.len()
        );
    }

    #[test]
    fn test_oversample_length_and_gain() {
        let input: Vec<f32> = (0..4800)
            .map(|i| 0.5 * (i as f32 * 1000.0 * 2.0 * std::f32::consts::PI / 48000.0).sin())
            .collect();
        let output = oversample(&input, 4).unwrap();
        assert!(output.len() >= input.len() * 4);

        let peak = output.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.02, "oversampled peak {}", peak);
    }

    #[test]
    fn test_oversample_finds_intersample_peak() {
        // fs/4 sine sampled at 45 degrees: every sample is +-0.707, true peak is 1.0
        let input: Vec<f32> = (0..4096)
            .map(|i| (std::f32::consts::FRAC_PI_2 * i as f32 + std::f32::consts::FRAC_PI_4).sin())
            .collect();
        let sample_peak = input.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        let true_peak = oversample(&input, 4)
            .unwrap()
            .iter()
            .fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!(sample_peak < 0.72);
        assert!(true_peak > 0.9, "true peak {}", true_peak);
    }

    #[test]
    fn test_bessel_i0_known_values() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-12);
        assert!((bessel_i0(1.0) - 1.266_065_877_752_008).abs() < 1e-9);
    }
}
