//! Energy, loudness and brightness summaries
//!
//! Scalar descriptors reported on a 0-100 scale for display:
//! - Energy: mean frame RMS × 1000, clamped to [0, 100]
//! - Loudness: mean frame RMS in dB, mapped linearly from [-23, -5] dB onto
//!   [0, 100], clamped
//! - Spectral centroid: mean per-frame centroid in Hz, unclamped

use super::spectral::descriptors::{mean, spectral_centroid};
use super::spectral::Spectrogram;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Lower end of the practical loudness range in dB
const LOUDNESS_FLOOR_DB: f32 = -23.0;

/// Width of the practical loudness range in dB (-23 to -5)
const LOUDNESS_SPAN_DB: f32 = 18.0;

/// Energy score from frame RMS values
pub fn energy_score(frame_rms: &[f32]) -> f32 {
    let score = mean(frame_rms) * 1000.0;
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Loudness score from frame RMS values
pub fn loudness_score(frame_rms: &[f32]) -> f32 {
    let db = 20.0 * (mean(frame_rms) + EPSILON).log10();
    let score = (db - LOUDNESS_FLOOR_DB) / LOUDNESS_SPAN_DB * 100.0;
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Mean spectral centroid in Hz
pub fn centroid_summary(spec: &Spectrogram) -> f32 {
    mean(&spectral_centroid(spec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_clamps() {
        assert_eq!(energy_score(&[]), 0.0);
        assert_eq!(energy_score(&[0.0; 10]), 0.0);
        assert!((energy_score(&[0.05; 10]) - 50.0).abs() < 1e-3);
        assert_eq!(energy_score(&[1.0; 10]), 100.0);
        assert_eq!(energy_score(&[f32::INFINITY]), 0.0);
    }

    #[test]
    fn test_loudness_clamps() {
        assert_eq!(loudness_score(&[0.0; 10]), 0.0);
        assert_eq!(loudness_score(&[1.0; 10]), 100.0);

        // -14 dB sits halfway through the range
        let rms = 10.0f32.powf(-14.0 / 20.0);
        assert!((loudness_score(&[rms]) - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_loudness_monotonic() {
        let quiet = loudness_score(&[0.08]);
        let loud = loudness_score(&[0.3]);
        assert!(loud > quiet);
    }
}
