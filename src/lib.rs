//! # Acoustic Profile
//!
//! An acoustic profiling engine: turns an audio excerpt into tempo, key,
//! energy and loudness, mastering quality metrics and a probabilistic genre
//! label.
//!
//! ## Features
//!
//! - **Tempo**: onset-envelope autocorrelation with a kick/cowbell-weighted refinement
//! - **Key**: chroma profile correlated against Krumhansl-Kessler templates
//! - **Mastering**: loudness proxy, 4× oversampled true peak, pink-referenced band
//!   balance, crest factor and genre-aware recommendations
//! - **Genre**: weighted distance to a database of genre signatures, optionally
//!   fused with a neural classifier (ONNX, feature `ml`)
//!
//! ## Quick Start
//!
//! ```no_run
//! use acoustic_profile::analyze_file;
//!
//! let report = analyze_file(std::path::Path::new("track.mp3"));
//! if let Some(err) = &report.error {
//!     eprintln!("analysis failed: {}", err);
//! }
//! println!("{:.1} BPM, {}, {} ({:.2})", report.bpm, report.key, report.genre, report.genre_confidence);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Decode → mono buffer ─┬→ 22.05 kHz, first 60 s → STFT → tempo / key / energy / timbre
//!                       └→ 48 kHz, full length   → mastering report
//!                                                       ↓
//!                                  genre matcher (+ neural classifier) → report
//! ```
//!
//! Analysis never fails past [`Analyzer::analyze_audio`] / [`Analyzer::analyze_file`]:
//! every problem is reported in-band through sentinels or the report's `error` field.

#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod genre;
pub mod io;
pub mod mastering;
pub mod preprocessing;

use std::path::Path;
use std::sync::Arc;

// Re-export main types
pub use analysis::result::{AcousticReport, FeatureVector, Key, Mode};
pub use analysis::transcription::{Transcriber, Transcription};
pub use config::{AnalysisConfig, MatcherConfig};
pub use error::AnalysisError;
pub use genre::{GenreClassifier, GenreSource, NeuralClassifier, SignatureDatabase};
pub use io::AudioBuffer;
pub use mastering::MasteringReport;

use analysis::result::round_to;
use features::spectral::FeatureSurface;
use genre::classifier::SURFACE_SIZE;
use genre::MatchInput;

/// Configured analysis pipeline
///
/// Holds the read-only signature table and the capabilities resolved at
/// startup. One analyzer can serve many analyses, including concurrently.
#[derive(Debug)]
pub struct Analyzer {
    config: AnalysisConfig,
    signatures: Arc<SignatureDatabase>,
    classifier: NeuralClassifier,
    transcription: Transcription,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            config: AnalysisConfig::default(),
            signatures: Arc::new(SignatureDatabase::builtin().clone()),
            classifier: NeuralClassifier::Unavailable,
            transcription: Transcription::Unavailable,
        }
    }
}

impl Analyzer {
    /// Analyzer with the built-in signatures and no optional capabilities
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the configuration is invalid.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Use a custom signature table
    pub fn with_signatures(mut self, signatures: Arc<SignatureDatabase>) -> Self {
        self.signatures = signatures;
        self
    }

    /// Attach a neural classifier capability
    pub fn with_classifier(mut self, classifier: NeuralClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Attach a transcription capability
    pub fn with_transcription(mut self, transcription: Transcription) -> Self {
        self.transcription = transcription;
        self
    }

    /// The configuration in use
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The signature table in use
    pub fn signatures(&self) -> &SignatureDatabase {
        &self.signatures
    }

    /// Analyse a decoded buffer
    ///
    /// Lyrics are always empty (transcription needs a file). Never fails: on
    /// error the returned report has `error` set and zeroed fields.
    pub fn analyze_audio(&self, buffer: &AudioBuffer) -> AcousticReport {
        match self.try_analyze(buffer) {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Analysis failed: {}", e);
                AcousticReport::failed(e.to_string())
            }
        }
    }

    /// Decode and analyse a file, transcribing lyrics if a transcriber is attached
    ///
    /// Never fails: an unreadable file yields a report with `error` set.
    pub fn analyze_file(&self, path: &Path) -> AcousticReport {
        log::debug!("Analysing {}", path.display());
        let buffer = match io::decode_audio(path) {
            Ok(buffer) => buffer,
            Err(e) => {
                log::warn!("Could not load {}: {}", path.display(), e);
                return AcousticReport::failed(e.to_string());
            }
        };

        let mut report = self.analyze_audio(&buffer);
        if !report.is_error() {
            report.lyrics = self.transcription.lyrics(path);
        }
        report
    }

    fn try_analyze(&self, buffer: &AudioBuffer) -> Result<AcousticReport, AnalysisError> {
        if buffer.samples().iter().any(|s| !s.is_finite()) {
            return Err(AnalysisError::InvalidInput(
                "Audio contains non-finite samples".to_string(),
            ));
        }

        let start = std::time::Instant::now();

        let analysis::FeatureAnalysis {
            features,
            spectrogram,
        } = analysis::extract_features(buffer, &self.config)?;

        let mut mastering = mastering::analyze_mastering(buffer, &self.config);

        let input = MatchInput {
            bpm: features.tempo.bpm,
            spectral_centroid: features.spectral_centroid,
            low_db_diff: mastering.frequency_balance.low_db_diff,
            mid_db_diff: mastering.frequency_balance.mid_db_diff,
            high_db_diff: mastering.frequency_balance.high_db_diff,
            crest_factor_db: mastering.transients.crest_factor_db,
        };
        let rule_based = genre::classify_rule_based(&input, &self.signatures, &self.config.matcher);

        let neural = if self.classifier.is_available() {
            match FeatureSurface::from_spectrogram(&spectrogram, SURFACE_SIZE, SURFACE_SIZE) {
                Ok(surface) => self.classifier.predict(&surface),
                Err(e) => {
                    log::warn!("Could not build classifier input: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let decision = genre::fuse(&rule_based, neural.as_ref(), &self.config.matcher);
        mastering.refresh_recommendations(Some(&decision.genre));

        log::debug!(
            "Analysis complete in {:.1} ms: {} ({:.2}, {:?})",
            start.elapsed().as_secs_f32() * 1000.0,
            decision.genre,
            decision.confidence,
            decision.source
        );

        Ok(AcousticReport {
            bpm: round_to(features.tempo.bpm, 1),
            key: features.key.name(),
            energy: round_to(features.energy, 1),
            loudness: round_to(features.loudness, 1),
            spectral_centroid: round_to(features.spectral_centroid, 1),
            spectral_magnitude: features.spectral_magnitude.clone(),
            genre: decision.genre,
            genre_confidence: round_to(decision.confidence, 2),
            genre_probabilities: decision.probabilities,
            genre_source: Some(decision.source),
            lyrics: String::new(),
            mastering,
            features: Some(features),
            error: None,
        })
    }
}

/// Analyse a decoded buffer with the default configuration
///
/// # Example
///
/// ```
/// use acoustic_profile::{analyze_audio, AudioBuffer};
///
/// let buffer = AudioBuffer::new(vec![0.0f32; 44100], 44100)?;
/// let report = analyze_audio(&buffer);
/// assert!(report.error.is_none());
/// # Ok::<(), acoustic_profile::AnalysisError>(())
/// ```
pub fn analyze_audio(buffer: &AudioBuffer) -> AcousticReport {
    Analyzer::default().analyze_audio(buffer)
}

/// Decode and analyse a file with the default configuration
pub fn analyze_file(path: &Path) -> AcousticReport {
    Analyzer::default().analyze_file(path)
}
