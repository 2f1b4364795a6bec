//! Integrated loudness proxy
//!
//! Approximates a BS.1770 reading without the standard's IIR filters or gating:
//!
//! 1. Weight the magnitude STFT (48 kHz) by an approximate K-weighting curve
//! 2. Per frame, RMS over bins of the weighted magnitude
//! 3. Average over frames: `r`
//! 4. `LUFS = -0.691 + 10 · log10(r² + 1e-10)`
//!
//! Readings differ from a certified meter; they are comparable between tracks
//! analysed by this crate, not against external tools.

use crate::features::spectral::Spectrogram;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Corner of the first-order high-pass stage in Hz
const HIGH_PASS_HZ: f32 = 100.0;

/// Pivot of the shelving stage in Hz
const SHELF_HZ: f32 = 4000.0;

/// Approximate K-weighting magnitude response
///
/// Product of a first-order high-pass `|jf / (jf + 100)|` and a shelf that
/// rises linearly towards 2.5 below 4 kHz, drops to 0.5 at the pivot and
/// recovers towards 1 above it.
/// DC has unity weight.
pub fn k_weighting(frequencies: &[f32]) -> Vec<f32> {
    frequencies
        .iter()
        .map(|&f| {
            if f <= 0.0 {
                return 1.0;
            }
            let high_pass = f / (f * f + HIGH_PASS_HZ * HIGH_PASS_HZ).sqrt();
            let shelf = if f < SHELF_HZ {
                1.0 + 1.5 * (f / SHELF_HZ)
            } else {
                1.0 - 0.5 * (SHELF_HZ / f)
            };
            high_pass * shelf
        })
        .collect()
}

/// Loudness proxy in LUFS from a mastering-rate spectrogram
///
/// # Returns
///
/// Loudness in LUFS, or `f32::NEG_INFINITY` when the weighted RMS is zero
/// (digital silence).
pub fn integrated_loudness(spec: &Spectrogram) -> f32 {
    let weights = k_weighting(&spec.frequencies());

    let frame_rms: Vec<f32> = spec
        .frames()
        .iter()
        .map(|frame| {
            let sum_sq: f32 = frame
                .iter()
                .zip(weights.iter())
                .map(|(&m, &w)| (m * w) * (m * w))
                .sum();
            (sum_sq / frame.len().max(1) as f32).sqrt()
        })
        .collect();

    let rms = if frame_rms.is_empty() {
        0.0
    } else {
        frame_rms.iter().sum::<f32>() / frame_rms.len() as f32
    };

    let lufs = if rms > 0.0 {
        -0.691 + 10.0 * (rms * rms + EPSILON).log10()
    } else {
        f32::NEG_INFINITY
    };

    log::debug!(
        "Loudness proxy: {} frames, weighted RMS {:.6} -> {:.2} LUFS",
        frame_rms.len(),
        rms,
        lufs
    );

    lufs
}
