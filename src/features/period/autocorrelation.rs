//! Autocorrelation-based tempo estimation
//!
//! Finds periodicity in an onset-strength envelope using FFT-accelerated
//! autocorrelation.
//!
//! # Algorithm
//!
//! 1. Remove the envelope's mean so the ACF measures periodic structure only
//! 2. Compute autocorrelation using FFT acceleration: `ACF = IFFT(|FFT(signal)|²)`
//! 3. Weight each lag by a log-normal tempo prior centered on 120 BPM
//! 4. Find peaks of the weighted ACF within the BPM range
//! 5. Convert lag values to BPM: `BPM = 60 * frame_rate / lag`, refining the
//!    best lag by parabolic interpolation
//!
//! # Reference
//!
//! Ellis, D. P. W., & Pikrakis, A. (2006). Real-time Beat Induction.
//! *Proceedings of the International Conference on Music Information Retrieval*.

use super::BpmCandidate;
use crate::error::AnalysisError;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

const EPSILON: f32 = 1e-10;

/// Center of the tempo prior in BPM
const PRIOR_CENTER_BPM: f32 = 120.0;

/// Width of the tempo prior in octaves
const PRIOR_OCTAVE_WIDTH: f32 = 1.0;

/// Estimate tempo candidates from an onset-strength envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength per frame
/// * `frame_rate` - Envelope frames per second (`sample_rate / hop_size`)
/// * `min_bpm` - Minimum BPM to consider
/// * `max_bpm` - Maximum BPM to consider
///
/// # Returns
///
/// BPM candidates ranked by prior-weighted periodicity (highest first).
/// Empty when the envelope carries no periodic energy (silence, a single
/// event, or a signal shorter than the slowest period).
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a non-positive frame rate or an
/// invalid BPM range.
pub fn estimate_tempo_candidates(
    envelope: &[f32],
    frame_rate: f32,
    min_bpm: f32,
    max_bpm: f32,
) -> Result<Vec<BpmCandidate>, AnalysisError> {
    log::debug!(
        "Estimating tempo from autocorrelation: {} frames at {:.2} fps, range=[{:.1}, {:.1}] BPM",
        envelope.len(),
        frame_rate,
        min_bpm,
        max_bpm
    );

    if !(frame_rate > 0.0) || !frame_rate.is_finite() {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid envelope frame rate: {}",
            frame_rate
        )));
    }

    if min_bpm <= 0.0 || max_bpm <= 0.0 || min_bpm >= max_bpm {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid BPM range: [{:.1}, {:.1}]",
            min_bpm, max_bpm
        )));
    }

    if envelope.len() < 4 {
        return Ok(vec![]);
    }

    // Step 1: remove DC
    let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
    let centered: Vec<f32> = envelope.iter().map(|&v| v - mean).collect();

    // Step 2: autocorrelation
    let acf = compute_autocorrelation_fft(&centered)?;
    if acf[0] <= EPSILON {
        log::debug!("Onset envelope has no variance, no tempo");
        return Ok(vec![]);
    }

    // Step 3: lag range
    // lag = 60 * frame_rate / BPM
    let lag_min = ((60.0 * frame_rate) / max_bpm).ceil().max(1.0) as usize;
    let lag_max = ((60.0 * frame_rate) / min_bpm).floor() as usize;
    let lag_max = lag_max.min(acf.len().saturating_sub(2));

    if lag_min + 2 > lag_max {
        log::warn!(
            "Envelope too short for tempo search: lag range [{}, {}], ACF length {}",
            lag_min,
            lag_max,
            acf.len()
        );
        return Ok(vec![]);
    }

    // Step 4: prior-weighted ACF over the full searchable range (one lag of
    // margin on both sides for peak detection and interpolation)
    let lo = lag_min - 1;
    let hi = lag_max + 1;
    let weighted: Vec<f32> = (lo..=hi)
        .map(|lag| {
            let bpm = 60.0 * frame_rate / lag as f32;
            acf[lag] / acf[0] * tempo_prior(bpm)
        })
        .collect();

    let peaks = find_peaks_in_acf(&weighted, lo)?;
    let best_value = peaks.first().map(|&(_, v)| v).unwrap_or(0.0);
    if best_value <= EPSILON {
        return Ok(vec![]);
    }

    // Step 5: convert to BPM with parabolic refinement
    let mut candidates = Vec::with_capacity(peaks.len());
    for (lag, value) in peaks {
        if lag < lag_min || lag > lag_max {
            continue;
        }
        let idx = lag - lo;
        let offset = parabolic_offset(weighted[idx - 1], weighted[idx], weighted[idx + 1]);
        let refined_lag = lag as f32 + offset;
        let bpm = 60.0 * frame_rate / refined_lag;
        if bpm >= min_bpm && bpm <= max_bpm {
            candidates.push(BpmCandidate {
                bpm,
                confidence: (value / best_value).clamp(0.0, 1.0),
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    log::debug!(
        "Autocorrelation found {} tempo candidates (best {:.2} BPM)",
        candidates.len(),
        candidates.first().map(|c| c.bpm).unwrap_or(0.0)
    );

    Ok(candidates)
}

/// Best tempo of an onset-strength envelope, or 0.0 if none is found
///
/// # Errors
///
/// Same as [`estimate_tempo_candidates`].
pub fn estimate_tempo(
    envelope: &[f32],
    frame_rate: f32,
    min_bpm: f32,
    max_bpm: f32,
) -> Result<f32, AnalysisError> {
    let candidates = estimate_tempo_candidates(envelope, frame_rate, min_bpm, max_bpm)?;
    Ok(candidates.first().map(|c| c.bpm).unwrap_or(0.0))
}

/// Log-normal preference for tempi near 120 BPM
fn tempo_prior(bpm: f32) -> f32 {
    let octaves = (bpm / PRIOR_CENTER_BPM).log2() / PRIOR_OCTAVE_WIDTH;
    (-0.5 * octaves * octaves).exp()
}

/// Vertex offset of the parabola through three equally spaced points, in [-0.5, 0.5]
fn parabolic_offset(left: f32, center: f32, right: f32) -> f32 {
    let denom = left - 2.0 * center + right;
    if denom.abs() < EPSILON {
        return 0.0;
    }
    (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
}

/// Compute autocorrelation using FFT acceleration
///
/// Uses the identity: ACF = IFFT(|FFT(signal)|²)
///
/// # Returns
///
/// Autocorrelation function (same length as input), negative lags clamped to 0
fn compute_autocorrelation_fft(signal: &[f32]) -> Result<Vec<f32>, AnalysisError> {
    let n = signal.len();
    if n == 0 {
        return Err(AnalysisError::InvalidInput(
            "Empty signal for autocorrelation".to_string(),
        ));
    }

    // FFT size: next power of 2 >= 2*n (for zero-padding)
    let fft_size = (2 * n).next_power_of_two();

    let mut fft_input: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    fft_input.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut fft_input);

    for x in &mut fft_input {
        *x = *x * x.conj();
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut fft_input);

    let scale = 1.0 / (fft_size as f32);
    let acf: Vec<f32> = fft_input[..n]
        .iter()
        .map(|x| (x.re * scale).max(0.0))
        .collect();

    if acf.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::NumericalError(
            "Non-finite autocorrelation".to_string(),
        ));
    }

    Ok(acf)
}

/// Find peaks in autocorrelation function
///
/// Finds local maxima with minimum prominence (10% of the slice maximum).
///
/// # Arguments
///
/// * `acf_slice` - Slice of ACF to search (already filtered to lag range)
/// * `offset` - Offset to add to indices (first lag of the slice)
///
/// # Returns
///
/// Vector of (lag, value) pairs for detected peaks, highest first
fn find_peaks_in_acf(acf_slice: &[f32], offset: usize) -> Result<Vec<(usize, f32)>, AnalysisError> {
    if acf_slice.len() < 3 {
        return Ok(vec![]);
    }

    let max_value = acf_slice.iter().copied().fold(0.0f32, f32::max);
    if max_value < EPSILON {
        return Ok(vec![]);
    }

    let min_prominence = max_value * 0.1;
    let min_distance = 2;

    let mut peaks: Vec<(usize, f32)> = Vec::new();

    for i in 1..(acf_slice.len() - 1) {
        let value = acf_slice[i];

        if value > acf_slice[i - 1] && value >= acf_slice[i + 1] {
            let prominence = value - acf_slice[i - 1].min(acf_slice[i + 1]);
            if prominence < min_prominence && value < max_value {
                continue;
            }

            let lag = i + offset;
            match peaks.last_mut() {
                Some(last) if lag - last.0 < min_distance => {
                    // Keep the higher peak if too close
                    if value > last.1 {
                        *last = (lag, value);
                    }
                }
                _ => peaks.push((lag, value)),
            }
        }
    }

    peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(peaks)
}
