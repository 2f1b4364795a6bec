//! Onset event picking
//!
//! Turns an onset-strength envelope into discrete onset frames. A frame is an
//! onset when it is:
//! 1. the maximum of its recent neighbourhood (`PRE_MAX_SECS` back, one frame ahead),
//! 2. at least `DELTA` above the local mean (`AVG_SECS` either side),
//! 3. above the global median + MAD threshold, and
//! 4. at least `WAIT_SECS` after the previous onset.
//!
//! The envelope is normalised to [0, 1] first, so the thresholds are scale-free.
//!
//! # Reference
//!
//! McFee, B., & Ellis, D. P. W. (2014). Better Beat Tracking Through Robust Onset Aggregation.
//! *Proceedings of the International Society for Music Information Retrieval Conference*.

use crate::error::AnalysisError;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

const PRE_MAX_SECS: f32 = 0.03;
const AVG_SECS: f32 = 0.10;
const WAIT_SECS: f32 = 0.03;
const DELTA: f32 = 0.07;
const MAD_MULTIPLIER: f32 = 1.0;

/// Compute adaptive threshold using median + MAD (Median Absolute Deviation)
///
/// `threshold = median(values) + k * MAD(values)`
/// where MAD = median(|values - median(values)|)
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `values` is empty or `k` is negative.
pub fn adaptive_threshold_median_mad(values: &[f32], k: f32) -> Result<f32, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Empty values for threshold calculation".to_string(),
        ));
    }

    if k < 0.0 {
        return Err(AnalysisError::InvalidInput(
            "MAD multiplier k must be non-negative".to_string(),
        ));
    }

    let median = median_of(values);
    let deviations: Vec<f32> = values.iter().map(|&v| (v - median).abs()).collect();
    let mad = median_of(&deviations);

    Ok(median + k * mad)
}

fn median_of(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) * 0.5
    } else {
        sorted[mid]
    }
}

/// Pick onset frames from an onset-strength envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength per frame (see [`super::spectral_flux::onset_strength`])
/// * `frame_rate` - Envelope frames per second (`sample_rate / hop_size`)
///
/// # Returns
///
/// Onset frame indices in increasing order. Empty for a flat or silent envelope.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `frame_rate` is not positive.
pub fn pick_onset_frames(envelope: &[f32], frame_rate: f32) -> Result<Vec<usize>, AnalysisError> {
    if !(frame_rate > 0.0) || !frame_rate.is_finite() {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid envelope frame rate: {}",
            frame_rate
        )));
    }

    let max = envelope.iter().copied().fold(0.0f32, f32::max);
    if envelope.len() < 3 || max <= EPSILON {
        return Ok(Vec::new());
    }

    let normalized: Vec<f32> = envelope.iter().map(|&v| v / max).collect();
    let global_threshold = adaptive_threshold_median_mad(&normalized, MAD_MULTIPLIER)?;

    let to_frames = |secs: f32| ((secs * frame_rate).round() as usize).max(1);
    let pre_max = to_frames(PRE_MAX_SECS);
    let avg = to_frames(AVG_SECS);
    let wait = to_frames(WAIT_SECS);

    let n = normalized.len();
    let mut onsets: Vec<usize> = Vec::new();

    for i in 0..n {
        let value = normalized[i];
        if value <= global_threshold {
            continue;
        }

        let max_lo = i.saturating_sub(pre_max);
        let max_hi = (i + 1).min(n - 1);
        let local_max = normalized[max_lo..=max_hi]
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        if value < local_max {
            continue;
        }

        let avg_lo = i.saturating_sub(avg);
        let avg_hi = (i + avg).min(n - 1);
        let window = &normalized[avg_lo..=avg_hi];
        let local_mean = window.iter().sum::<f32>() / window.len() as f32;
        if value < local_mean + DELTA {
            continue;
        }

        if let Some(&last) = onsets.last() {
            if i - last < wait {
                continue;
            }
        }
        onsets.push(i);
    }

    log::debug!(
        "Picked {} onsets from {} envelope frames (global threshold {:.3})",
        onsets.len(),
        n,
        global_threshold
    );

    Ok(onsets)
}
