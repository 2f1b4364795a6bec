//! Configuration parameters for audio analysis and genre matching

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Analysis configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // STFT parameters
    /// Frame size for STFT (default: 2048)
    pub frame_size: usize,

    /// Hop size for STFT (default: 512)
    pub hop_size: usize,

    // Sample rates
    /// Sample rate for the feature path: BPM, key, energy, timbre (default: 22050)
    pub feature_sample_rate: u32,

    /// Sample rate for the mastering path: LUFS, peak, balance (default: 48000)
    pub mastering_sample_rate: u32,

    /// Only the first N seconds are used for the feature path (default: 60.0)
    /// The mastering path always sees the whole buffer.
    pub max_feature_duration_secs: f32,

    // BPM detection
    /// Minimum BPM for the baseline tempo search (default: 30.0)
    pub min_bpm: f32,

    /// Maximum BPM for the baseline tempo search (default: 300.0)
    pub max_bpm: f32,

    /// A perceptually refined tempo is only trusted inside this range (default: 60-200)
    pub plausible_bpm: (f32, f32),

    // Timbre
    /// Number of MFCC coefficients (default: 13)
    pub n_mfcc: usize,

    /// Number of mel bands for MFCC and the classifier surface (default: 128)
    pub n_mels: usize,

    /// Energy fraction for spectral rolloff (default: 0.85)
    pub rolloff_percent: f32,

    // Visualization
    /// Bins in the report's spectral magnitude preview (default: 20)
    pub spectrum_bins: usize,

    /// Log-spaced bins in the mastering balance spectrum (default: 64)
    pub balance_bins: usize,

    /// Genre matcher tunables
    pub matcher: MatcherConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            feature_sample_rate: 22050,
            mastering_sample_rate: 48000,
            max_feature_duration_secs: 60.0,
            min_bpm: 30.0,
            max_bpm: 300.0,
            plausible_bpm: (60.0, 200.0),
            n_mfcc: 13,
            n_mels: 128,
            rolloff_percent: 0.85,
            spectrum_bins: 20,
            balance_bins: 64,
            matcher: MatcherConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check that the parameters describe a usable analysis
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.frame_size == 0 || self.hop_size == 0 {
            return Err(AnalysisError::InvalidInput(
                "Frame size and hop size must be > 0".to_string(),
            ));
        }
        if self.feature_sample_rate == 0 || self.mastering_sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Sample rates must be > 0".to_string(),
            ));
        }
        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid BPM range: [{:.1}, {:.1}]",
                self.min_bpm, self.max_bpm
            )));
        }
        self.matcher.validate()
    }
}

/// Per-dimension weights of the matcher's weighted Euclidean distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights {
    /// Tempo (default: 0.25)
    pub bpm: f32,
    /// Spectral centroid (default: 0.15)
    pub centroid: f32,
    /// Low band dB difference (default: 0.20)
    pub low: f32,
    /// Mid band dB difference (default: 0.15)
    pub mid: f32,
    /// High band dB difference (default: 0.10)
    pub high: f32,
    /// Crest factor (default: 0.15)
    pub crest: f32,
}

impl DimensionWeights {
    /// Weights in feature-vector order
    pub fn as_array(&self) -> [f32; 6] {
        [self.bpm, self.centroid, self.low, self.mid, self.high, self.crest]
    }
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            bpm: 0.25,
            centroid: 0.15,
            low: 0.20,
            mid: 0.15,
            high: 0.10,
            crest: 0.15,
        }
    }
}

/// Confidence boost for bass-heavy music in the phonk/trap tempo band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BassBoost {
    /// Inclusive BPM range in which the boost may fire (default: 130-150)
    pub bpm_range: (f32, f32),
    /// Low band must exceed this many dB over the reference (default: 3.0)
    pub min_low_db: f32,
    /// Confidence multiplier, result capped at 1.0 (default: 1.3)
    pub factor: f32,
    /// Genres receiving the boost
    pub genres: Vec<String>,
}

impl Default for BassBoost {
    fn default() -> Self {
        Self {
            bpm_range: (130.0, 150.0),
            min_low_db: 3.0,
            factor: 1.3,
            genres: vec![
                "Dark Phonk".to_string(),
                "Drift Phonk".to_string(),
                "Trap".to_string(),
            ],
        }
    }
}

/// Genre matcher configuration
///
/// The weights and the decay scale are hand-tuned heuristics; the defaults
/// reproduce the reference scoring and are exposed so hosts can retune them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Distance weights per dimension
    pub weights: DimensionWeights,

    /// `confidence = exp(-distance * decay_scale)` (default: 2.0)
    pub decay_scale: f32,

    /// BPM normalisation range (default: 60-200)
    pub bpm_span: (f32, f32),

    /// Centroid normalisation divisor in Hz (default: 5000.0)
    pub centroid_scale: f32,

    /// Half-width of the dB window mapped onto [0, 1] (default: 5.0)
    pub db_window: f32,

    /// Crest factor normalisation divisor in dB (default: 20.0)
    pub crest_scale: f32,

    /// Phonk/trap boost
    pub boost: BassBoost,

    /// Re-normalise the probability map to sum to 1 (default: true)
    pub normalize_probabilities: bool,

    /// Neural predictions at or above this confidence win outright (default: 0.7)
    pub neural_threshold: f32,

    /// Scale for rule-based probabilities merged under a neural map (default: 0.3)
    pub rule_blend: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            weights: DimensionWeights::default(),
            decay_scale: 2.0,
            bpm_span: (60.0, 200.0),
            centroid_scale: 5000.0,
            db_window: 5.0,
            crest_scale: 20.0,
            boost: BassBoost::default(),
            normalize_probabilities: true,
            neural_threshold: 0.7,
            rule_blend: 0.3,
        }
    }
}

impl MatcherConfig {
    /// Reject configurations that would make the distance meaningless
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.weights.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AnalysisError::InvalidInput(
                "Matcher weights must be finite and non-negative".to_string(),
            ));
        }
        if !(self.decay_scale > 0.0) {
            return Err(AnalysisError::InvalidInput(
                "Decay scale must be > 0".to_string(),
            ));
        }
        if self.bpm_span.1 <= self.bpm_span.0
            || self.centroid_scale <= 0.0
            || self.db_window <= 0.0
            || self.crest_scale <= 0.0
        {
            return Err(AnalysisError::InvalidInput(
                "Matcher normalisation constants must be positive".to_string(),
            ));
        }
        if self.boost.factor < 1.0 {
            return Err(AnalysisError::InvalidInput(
                "Boost factor must be >= 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let sum: f32 = DimensionWeights::default().as_array().iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "weights sum to {}", sum);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.hop_size = 0;
        assert!(config.validate().is_err());

        let mut matcher = MatcherConfig::default();
        matcher.weights.bpm = -0.1;
        assert!(matcher.validate().is_err());

        let mut matcher = MatcherConfig::default();
        matcher.decay_scale = 0.0;
        assert!(matcher.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "hop_size": 256, "matcher": { "decay_scale": 3.0 } }"#)
                .unwrap();
        assert_eq!(config.hop_size, 256);
        assert_eq!(config.frame_size, 2048);
        assert_eq!(config.matcher.decay_scale, 3.0);
        assert_eq!(config.matcher.weights, DimensionWeights::default());
    }
}
