//! Mastering quality analysis
//!
//! Runs on the full buffer at the mastering rate (48 kHz by default):
//! - Integrated loudness proxy (K-weighted magnitude spectrogram)
//! - True peak (4× oversampled)
//! - Frequency balance against a pink reference
//! - Crest factor and transient count
//! - Rule-based recommendations
//!
//! Every measurement is independent. One that fails is replaced by its
//! sentinel value and logged; the report as a whole is always produced.

pub mod advice;
pub mod balance;
pub mod loudness;
pub mod peak;
pub mod transients;

pub use advice::{generate_advice, Advice, AdviceKind};
pub use balance::{analyze_balance, BalanceReport};
pub use loudness::integrated_loudness;
pub use peak::{measure_true_peak, PeakReport};
pub use transients::{analyze_transients, TransientReport};

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::spectral::compute_stft;
use crate::io::AudioBuffer;

/// Complete mastering report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteringReport {
    /// Loudness proxy in LUFS; `-inf` for silence or a failed measurement
    pub lufs: f32,

    /// True peak
    pub peak: PeakReport,

    /// Band balance against the pink reference
    pub frequency_balance: BalanceReport,

    /// Crest factor and transients
    pub transients: TransientReport,

    /// Advisory records
    pub recommendations: Vec<Advice>,
}

impl MasteringReport {
    /// Report made entirely of sentinels
    pub fn unavailable() -> Self {
        Self {
            lufs: f32::NEG_INFINITY,
            peak: PeakReport::unavailable(),
            frequency_balance: BalanceReport::unavailable(),
            transients: TransientReport::unavailable(),
            recommendations: Vec::new(),
        }
    }

    /// Replace the recommendations with ones tailored to `genre`
    pub fn refresh_recommendations(&mut self, genre: Option<&str>) {
        self.recommendations = generate_advice(self, genre);
    }
}

/// Unwrap a sub-analysis result, falling back to `sentinel` on error
fn or_sentinel<T>(what: &str, result: Result<T, AnalysisError>, sentinel: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::warn!("{} analysis failed, using sentinel: {}", what, e);
            sentinel()
        }
    }
}

/// Analyse mastering quality of a buffer
///
/// The buffer is resampled to `config.mastering_sample_rate`; if that fails the
/// native rate is used. One STFT is shared by loudness, balance and transients.
/// Recommendations are generated without genre context; call
/// [`MasteringReport::refresh_recommendations`] once the genre is known.
///
/// # Arguments
///
/// * `buffer` - Full mono buffer at any rate
/// * `config` - Analysis configuration
///
/// # Returns
///
/// A report in which any failed measurement holds its sentinel. Never fails.
pub fn analyze_mastering(buffer: &AudioBuffer, config: &AnalysisConfig) -> MasteringReport {
    let buffer = match buffer.resampled(config.mastering_sample_rate) {
        Ok(resampled) => resampled,
        Err(e) => {
            log::warn!(
                "Resampling to {} Hz failed, analysing at {} Hz: {}",
                config.mastering_sample_rate,
                buffer.sample_rate(),
                e
            );
            buffer.clone()
        }
    };
    let samples = buffer.samples();

    log::debug!(
        "Mastering analysis: {} samples at {} Hz ({:.2}s)",
        samples.len(),
        buffer.sample_rate(),
        buffer.duration_secs()
    );

    let peak = or_sentinel("Peak", measure_true_peak(samples), PeakReport::unavailable);

    let (lufs, frequency_balance, transients) =
        match compute_stft(samples, buffer.sample_rate(), config.frame_size, config.hop_size) {
            Ok(spec) => (
                integrated_loudness(&spec),
                or_sentinel(
                    "Frequency balance",
                    analyze_balance(&spec, config.balance_bins),
                    BalanceReport::unavailable,
                ),
                or_sentinel(
                    "Transient",
                    analyze_transients(samples, &spec),
                    TransientReport::unavailable,
                ),
            ),
            Err(e) => {
                log::warn!("Mastering STFT failed, using sentinels: {}", e);
                (
                    f32::NEG_INFINITY,
                    BalanceReport::unavailable(),
                    TransientReport::unavailable(),
                )
            }
        };

    let mut report = MasteringReport {
        lufs,
        peak,
        frequency_balance,
        transients,
        recommendations: Vec::new(),
    };
    report.refresh_recommendations(None);

    log::debug!(
        "Mastering: {:.2} LUFS, peak {:.2} dBFS, crest {:.2} dB",
        report.lufs,
        report.peak.dbfs,
        report.transients.crest_factor_db
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_silence_uses_sentinels_without_failing() {
        let buffer = AudioBuffer::new(vec![0.0; 44100], 44100).unwrap();
        let report = analyze_mastering(&buffer, &AnalysisConfig::default());
        assert_eq!(report.lufs, f32::NEG_INFINITY);
        assert_eq!(report.peak.dbfs, f32::NEG_INFINITY);
        assert!(!report.peak.clipping);
        assert!(report.transients.over_compressed);
        assert!(!report.recommendations.is_empty());
    }

    #[test]
    fn test_invariants_hold_on_tone() {
        let samples: Vec<f32> = (0..44100)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let buffer = AudioBuffer::new(samples, 44100).unwrap();
        let report = analyze_mastering(&buffer, &AnalysisConfig::default());

        assert!(report.lufs.is_finite());
        assert_eq!(report.peak.clipping, report.peak.dbfs > 0.0);
        assert_eq!(
            report.transients.over_compressed,
            report.transients.crest_factor_db < 10.0
        );
        assert!((report.peak.amplitude - 0.5).abs() < 0.05, "peak {}", report.peak.amplitude);
        assert_eq!(report.frequency_balance.spectrum.len(), 64);
    }

    #[test]
    fn test_refresh_recommendations_uses_genre() {
        let mut report = MasteringReport::unavailable();
        report.transients.crest_factor_db = 12.0;
        report.refresh_recommendations(Some("Classical"));
        assert_eq!(report.recommendations.last().map(|a| a.kind), Some(AdviceKind::Warning));

        report.refresh_recommendations(None);
        assert_eq!(report.recommendations.last().map(|a| a.kind), Some(AdviceKind::Success));
    }

    #[test]
    fn test_unavailable_serializes_lufs_as_null() {
        let json = serde_json::to_value(MasteringReport::unavailable()).unwrap();
        assert!(json["lufs"].is_null());
        assert!(json["peak"]["peak_dbfs"].is_null());
        assert_eq!(json["transients"]["crest_factor_db"], 10.0);
    }
}
