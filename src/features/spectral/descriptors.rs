//! Frame-level spectral and temporal descriptors
//!
//! - RMS energy and zero-crossing rate over centered time-domain frames
//! - Spectral centroid and rolloff per STFT frame
//! - Strided magnitude preview for visualization

use super::stft::Spectrogram;
use crate::error::AnalysisError;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Time-domain frames centered on `t * hop_size`, zero-padded at both ends
///
/// Uses the same framing as [`super::stft::compute_stft`], so frame `t` here
/// lines up with spectrogram frame `t`.
fn for_each_centered_frame<F>(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
    mut f: F,
) -> Result<(), AnalysisError>
where
    F: FnMut(&[f32]),
{
    if frame_size == 0 || hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Frame size and hop size must be > 0".to_string(),
        ));
    }

    let pad = frame_size / 2;
    let n_frames = 1 + samples.len() / hop_size;
    let mut frame = vec![0.0f32; frame_size];

    for t in 0..n_frames {
        let center = t * hop_size;
        for (i, slot) in frame.iter_mut().enumerate() {
            *slot = (center + i)
                .checked_sub(pad)
                .and_then(|idx| samples.get(idx))
                .copied()
                .unwrap_or(0.0);
        }
        f(&frame);
    }
    Ok(())
}

/// Root-mean-square amplitude per frame
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `frame_size` or `hop_size` is 0.
pub fn frame_rms(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<f32>, AnalysisError> {
    let mut rms = Vec::with_capacity(1 + samples.len() / hop_size.max(1));
    for_each_centered_frame(samples, frame_size, hop_size, |frame| {
        let sum_sq: f32 = frame.iter().map(|&x| x * x).sum();
        rms.push((sum_sq / frame.len() as f32).sqrt());
    })?;
    Ok(rms)
}

/// Fraction of adjacent sample pairs that change sign, per frame
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `frame_size` or `hop_size` is 0.
pub fn zero_crossing_rate(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<f32>, AnalysisError> {
    let mut zcr = Vec::with_capacity(1 + samples.len() / hop_size.max(1));
    for_each_centered_frame(samples, frame_size, hop_size, |frame| {
        let crossings = frame
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count();
        zcr.push(crossings as f32 / frame.len() as f32);
    })?;
    Ok(zcr)
}

/// Spectral centroid (magnitude-weighted mean frequency) per frame, in Hz
///
/// Frames with no energy have a centroid of 0.
pub fn spectral_centroid(spec: &Spectrogram) -> Vec<f32> {
    let freqs = spec.frequencies();
    spec.frames()
        .iter()
        .map(|frame| {
            let weighted: f32 = frame.iter().zip(&freqs).map(|(&m, &f)| m * f).sum();
            let total: f32 = frame.iter().sum();
            if total > EPSILON {
                weighted / total
            } else {
                0.0
            }
        })
        .collect()
}

/// Spectral rolloff per frame, in Hz
///
/// Lowest bin frequency below which `percent` of the frame's magnitude lies.
/// Frames with no energy have a rolloff of 0.
pub fn spectral_rolloff(spec: &Spectrogram, percent: f32) -> Vec<f32> {
    let percent = percent.clamp(0.0, 1.0);
    spec.frames()
        .iter()
        .map(|frame| {
            let total: f32 = frame.iter().sum();
            if total <= EPSILON {
                return 0.0;
            }
            let threshold = percent * total;
            let mut cumulative = 0.0f32;
            for (k, &m) in frame.iter().enumerate() {
                cumulative += m;
                if cumulative >= threshold {
                    return spec.bin_frequency(k);
                }
            }
            spec.bin_frequency(frame.len().saturating_sub(1))
        })
        .collect()
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population standard deviation, 0 for an empty slice
pub fn std_dev(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|&v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32;
    var.sqrt()
}

/// Downsample a magnitude spectrum to `bins` values by striding, normalised to max 1
///
/// Takes every `len / bins`-th value starting at bin 0. A silent spectrum
/// stays all-zero.
pub fn magnitude_preview(magnitude: &[f32], bins: usize) -> Vec<f32> {
    if magnitude.is_empty() || bins == 0 {
        return vec![0.0; bins];
    }
    let step = (magnitude.len() / bins).max(1);
    let picked: Vec<f32> = (0..bins)
        .map(|i| magnitude.get(i * step).copied().unwrap_or(0.0))
        .collect();
    let max = picked.iter().copied().fold(0.0f32, f32::max);
    picked.iter().map(|&v| v / (max + EPSILON)).collect()
}
