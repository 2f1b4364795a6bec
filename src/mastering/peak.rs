//! True-peak measurement
//!
//! The signal is oversampled 4× so peaks between samples (which a DAC will
//! reconstruct) are caught, then the maximum absolute value is read.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::preprocessing::resample::oversample;

/// Oversampling factor for true-peak detection
pub const TRUE_PEAK_OVERSAMPLING: usize = 4;

/// Peak level of a signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakReport {
    /// True peak in dBFS (`-inf` for digital silence, serialised as `null`)
    #[serde(rename = "peak_dbfs")]
    pub dbfs: f32,

    /// True peak as linear amplitude (1.0 = full scale)
    #[serde(rename = "peak_amplitude")]
    pub amplitude: f32,

    /// Exactly `dbfs > 0.0`
    #[serde(rename = "clipping_detected")]
    pub clipping: bool,
}

impl PeakReport {
    /// Build a report from a linear peak amplitude
    pub fn from_amplitude(amplitude: f32) -> Self {
        let dbfs = if amplitude > 0.0 {
            20.0 * amplitude.log10()
        } else {
            f32::NEG_INFINITY
        };
        Self {
            dbfs,
            amplitude,
            clipping: dbfs > 0.0,
        }
    }

    /// Sentinel for a failed measurement: zero amplitude, `-inf` dBFS, no clipping
    pub fn unavailable() -> Self {
        Self::from_amplitude(0.0)
    }
}

/// Measure the true peak of a mono signal
///
/// # Errors
///
/// Returns `AnalysisError::NumericalError` if the signal contains non-finite samples.
pub fn measure_true_peak(samples: &[f32]) -> Result<PeakReport, AnalysisError> {
    if samples.iter().any(|s| !s.is_finite()) {
        return Err(AnalysisError::NumericalError(
            "Signal contains non-finite samples".to_string(),
        ));
    }

    let upsampled = oversample(samples, TRUE_PEAK_OVERSAMPLING)?;
    let sample_peak = samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
    let true_peak = upsampled.iter().fold(sample_peak, |m, &s| m.max(s.abs()));

    let report = PeakReport::from_amplitude(true_peak);
    log::debug!(
        "True peak: {:.4} ({:.2} dBFS, sample peak {:.4}), clipping={}",
        report.amplitude,
        report.dbfs,
        sample_peak,
        report.clipping
    );
    Ok(report)
}
