//! Frequency balance against a pink-noise reference
//!
//! The time-averaged magnitude spectrum is compared with `1 / (f + 1)`, a
//! pink-like slope that a balanced mix roughly follows. Three bands are
//! reported:
//!
//! | Band | Range |
//! |------|-------|
//! | low  | < 200 Hz |
//! | mid  | 200 Hz - 5 kHz |
//! | high | >= 5 kHz |
//!
//! Both spectra are normalised to a maximum of 1 before comparison, so the
//! band differences are independent of playback gain.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::features::spectral::Spectrogram;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Upper edge of the low band in Hz
pub const LOW_BAND_MAX_HZ: f32 = 200.0;

/// Upper edge of the mid band in Hz
pub const MID_BAND_MAX_HZ: f32 = 5000.0;

/// A band differing from the reference by more than this many dB is flagged
pub const WARNING_THRESHOLD_DB: f32 = 3.0;

/// Lowest frequency of the visualisation spectrum
const DISPLAY_MIN_HZ: f32 = 20.0;

/// Ratio between the highest and lowest display frequency (20 Hz to 20 kHz)
const DISPLAY_SPAN: f32 = 1000.0;

/// Band levels relative to the pink reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// Mean normalised magnitude below 200 Hz
    pub low_energy: f32,
    /// Mean normalised magnitude 200 Hz - 5 kHz
    pub mid_energy: f32,
    /// Mean normalised magnitude at and above 5 kHz
    pub high_energy: f32,

    /// Low band level over the reference in dB
    pub low_db_diff: f32,
    /// Mid band level over the reference in dB
    pub mid_db_diff: f32,
    /// High band level over the reference in dB
    pub high_db_diff: f32,

    /// One entry per band outside ±3 dB
    pub warnings: Vec<String>,

    /// Log-spaced magnitude spectrum for display, max-normalised
    #[serde(rename = "spectrum_data")]
    pub spectrum: Vec<f32>,

    /// Pink reference at the same display frequencies, max-normalised
    #[serde(rename = "pink_noise_data")]
    pub pink_noise: Vec<f32>,
}

impl BalanceReport {
    /// Sentinel for a failed analysis: flat bands, no warnings, empty spectra
    pub fn unavailable() -> Self {
        Self {
            low_energy: 0.0,
            mid_energy: 0.0,
            high_energy: 0.0,
            low_db_diff: 0.0,
            mid_db_diff: 0.0,
            high_db_diff: 0.0,
            warnings: Vec::new(),
            spectrum: Vec::new(),
            pink_noise: Vec::new(),
        }
    }
}

/// Pink reference `1 / (f + 1)` normalised to a maximum of 1
pub fn pink_reference(frequencies: &[f32]) -> Vec<f32> {
    let curve: Vec<f32> = frequencies.iter().map(|&f| 1.0 / (f.max(0.0) + 1.0)).collect();
    normalize_max(&curve)
}

fn normalize_max(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(0.0f32, f32::max);
    values.iter().map(|&v| v / (max + EPSILON)).collect()
}

/// Mean of `values` over bins whose frequency satisfies `in_band`; 0.0 for an empty band
fn band_mean<F>(values: &[f32], frequencies: &[f32], in_band: F) -> f32
where
    F: Fn(f32) -> bool,
{
    let (sum, count) = values
        .iter()
        .zip(frequencies.iter())
        .filter(|(_, &f)| in_band(f))
        .fold((0.0f32, 0usize), |(s, c), (&v, _)| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Band level over the reference in dB; 0.0 when the band has no bins
fn band_db(band: f32, reference: f32, has_bins: bool) -> f32 {
    if !has_bins {
        return 0.0;
    }
    20.0 * (band / (reference + EPSILON) + EPSILON).log10()
}

/// Sample `values` at `bins` log-spaced frequencies from 20 Hz (nearest STFT bin)
fn log_spaced(values: &[f32], frequencies: &[f32], bins: usize) -> Vec<f32> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let bin_width = if frequencies.len() > 1 {
        frequencies[1] - frequencies[0]
    } else {
        1.0
    };
    (0..bins)
        .map(|i| {
            let target = DISPLAY_MIN_HZ * DISPLAY_SPAN.powf(i as f32 / bins as f32);
            let k = ((target / bin_width).round() as usize).min(values.len() - 1);
            values[k]
        })
        .collect()
}

fn band_warnings(low: f32, mid: f32, high: f32) -> Vec<String> {
    let mut warnings = Vec::new();
    let bands = [
        (low, "Low end too dominant", "Low end lacking"),
        (mid, "Midrange too dominant", "Midrange lacking"),
        (high, "High end too harsh", "High end lacking"),
    ];
    for (diff, too_much, too_little) in bands {
        if diff > WARNING_THRESHOLD_DB {
            warnings.push(too_much.to_string());
        } else if diff < -WARNING_THRESHOLD_DB {
            warnings.push(too_little.to_string());
        }
    }
    warnings
}

/// Analyse the frequency balance of a mastering-rate spectrogram
///
/// # Arguments
///
/// * `spec` - Magnitude spectrogram (48 kHz, 2048 / 512 in the default pipeline)
/// * `display_bins` - Number of log-spaced points in the visualisation spectra
///
/// # Errors
///
/// Returns `AnalysisError::NumericalError` if the spectrum contains non-finite values.
pub fn analyze_balance(spec: &Spectrogram, display_bins: usize) -> Result<BalanceReport, AnalysisError> {
    let frequencies = spec.frequencies();
    let magnitude = spec.mean_magnitude();

    if magnitude.iter().any(|m| !m.is_finite()) {
        return Err(AnalysisError::NumericalError(
            "Spectrum contains non-finite values".to_string(),
        ));
    }

    let magnitude = normalize_max(&magnitude);
    let pink = pink_reference(&frequencies);

    let is_low = |f: f32| f < LOW_BAND_MAX_HZ;
    let is_mid = |f: f32| (LOW_BAND_MAX_HZ..MID_BAND_MAX_HZ).contains(&f);
    let is_high = |f: f32| f >= MID_BAND_MAX_HZ;

    let has_low = frequencies.iter().any(|&f| is_low(f));
    let has_mid = frequencies.iter().any(|&f| is_mid(f));
    let has_high = frequencies.iter().any(|&f| is_high(f));

    let low_energy = band_mean(&magnitude, &frequencies, is_low);
    let mid_energy = band_mean(&magnitude, &frequencies, is_mid);
    let high_energy = band_mean(&magnitude, &frequencies, is_high);

    let low_db_diff = band_db(low_energy, band_mean(&pink, &frequencies, is_low), has_low);
    let mid_db_diff = band_db(mid_energy, band_mean(&pink, &frequencies, is_mid), has_mid);
    let high_db_diff = band_db(high_energy, band_mean(&pink, &frequencies, is_high), has_high);

    let warnings = band_warnings(low_db_diff, mid_db_diff, high_db_diff);

    let spectrum = normalize_max(&log_spaced(&magnitude, &frequencies, display_bins));
    let pink_noise = normalize_max(&log_spaced(&pink, &frequencies, display_bins));

    log::debug!(
        "Balance: low {:+.2} dB, mid {:+.2} dB, high {:+.2} dB, {} warnings",
        low_db_diff,
        mid_db_diff,
        high_db_diff,
        warnings.len()
    );

    Ok(BalanceReport {
        low_energy,
        mid_energy,
        high_energy,
        low_db_diff,
        mid_db_diff,
        high_db_diff,
        warnings,
        spectrum,
        pink_noise,
    })
}
