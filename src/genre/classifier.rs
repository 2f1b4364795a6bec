//! Neural genre classifier capability and fusion with the rule-based matcher
//!
//! A classifier scores a fixed label set from a normalised mel
//! [`FeatureSurface`]. Whether one is present is decided once, when the
//! [`NeuralClassifier`] is constructed; the analysis path only asks it for a
//! prediction and falls back to the rule-based result when there is none.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::matcher::RuleBasedResult;
use crate::config::MatcherConfig;
use crate::error::AnalysisError;
use crate::features::spectral::FeatureSurface;

/// Labels of the bundled phonk/ambient model, in output order
pub const NEURAL_LABELS: [&str; 3] = ["Dark Phonk", "Drift Phonk", "Ambient"];

/// Surface size expected by the bundled model (mel bands and time steps)
pub const SURFACE_SIZE: usize = 128;

/// A model that scores genres from a feature surface
pub trait GenreClassifier: Send + Sync {
    /// Output labels, one per score
    fn labels(&self) -> &[String];

    /// Per-label scores (probabilities) for a surface
    ///
    /// # Errors
    ///
    /// Implementations return an error if inference fails; the caller then
    /// treats the classifier as having no opinion.
    fn predict(&self, surface: &FeatureSurface) -> Result<Vec<f32>, AnalysisError>;
}

/// Best label of a neural prediction plus the full score list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralPrediction {
    pub genre: String,
    pub confidence: f32,
    /// Score per label, in model order
    pub probabilities: Vec<(String, f32)>,
}

impl NeuralPrediction {
    /// Pair labels with scores and pick the arg-max
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ProcessingError` if the counts differ, there are
    /// no labels, or a score is not finite.
    pub fn from_scores(labels: &[String], scores: &[f32]) -> Result<Self, AnalysisError> {
        if labels.is_empty() || labels.len() != scores.len() {
            return Err(AnalysisError::ProcessingError(format!(
                "Classifier returned {} scores for {} labels",
                scores.len(),
                labels.len()
            )));
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(AnalysisError::ProcessingError(
                "Classifier returned non-finite scores".to_string(),
            ));
        }

        let mut best = 0;
        for (i, &s) in scores.iter().enumerate() {
            if s > scores[best] {
                best = i;
            }
        }

        Ok(Self {
            genre: labels[best].clone(),
            confidence: scores[best],
            probabilities: labels.iter().cloned().zip(scores.iter().copied()).collect(),
        })
    }
}

/// Neural classifier capability, resolved once at startup
pub enum NeuralClassifier {
    /// A loaded model
    Available(Box<dyn GenreClassifier>),
    /// No model; the rule-based matcher decides alone
    Unavailable,
}

impl NeuralClassifier {
    /// Wrap a classifier
    pub fn available<C: GenreClassifier + 'static>(classifier: C) -> Self {
        NeuralClassifier::Available(Box::new(classifier))
    }

    /// True if a model is loaded
    pub fn is_available(&self) -> bool {
        matches!(self, NeuralClassifier::Available(_))
    }

    /// Run the model, if any
    ///
    /// Inference errors are logged and reported as no prediction.
    pub fn predict(&self, surface: &FeatureSurface) -> Option<NeuralPrediction> {
        let NeuralClassifier::Available(classifier) = self else {
            return None;
        };

        let result = classifier
            .predict(surface)
            .and_then(|scores| NeuralPrediction::from_scores(classifier.labels(), &scores));

        match result {
            Ok(prediction) => {
                log::debug!(
                    "Neural genre: {} ({:.3})",
                    prediction.genre,
                    prediction.confidence
                );
                Some(prediction)
            }
            Err(e) => {
                log::warn!("Neural classifier failed, using rule-based result: {}", e);
                None
            }
        }
    }
}

impl Default for NeuralClassifier {
    fn default() -> Self {
        NeuralClassifier::Unavailable
    }
}

impl fmt::Debug for NeuralClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeuralClassifier::Available(c) => f
                .debug_tuple("Available")
                .field(&c.labels())
                .finish(),
            NeuralClassifier::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Which component decided the final label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreSource {
    RuleBased,
    Neural,
    Blended,
}

/// Final genre decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreDecision {
    pub genre: String,
    pub confidence: f32,
    pub probabilities: BTreeMap<String, f32>,
    pub source: GenreSource,
}

/// Combine the rule-based result with an optional neural prediction
///
/// - No prediction: the rule-based result as is.
/// - Prediction at or above `config.neural_threshold`: the prediction alone.
/// - Otherwise: neural scores for the model's labels, rule-based probabilities
///   scaled by `config.rule_blend` for every other genre; the label with the
///   higher confidence wins and the confidence is the larger of the two.
pub fn fuse(
    rule_based: &RuleBasedResult,
    neural: Option<&NeuralPrediction>,
    config: &MatcherConfig,
) -> GenreDecision {
    let Some(neural) = neural else {
        return GenreDecision {
            genre: rule_based.genre.clone(),
            confidence: rule_based.confidence,
            probabilities: rule_based.probabilities.clone(),
            source: GenreSource::RuleBased,
        };
    };

    let mut probabilities: BTreeMap<String, f32> = neural.probabilities.iter().cloned().collect();

    if neural.confidence >= config.neural_threshold {
        return GenreDecision {
            genre: neural.genre.clone(),
            confidence: neural.confidence,
            probabilities,
            source: GenreSource::Neural,
        };
    }

    for (genre, &p) in &rule_based.probabilities {
        probabilities
            .entry(genre.clone())
            .or_insert(p * config.rule_blend);
    }

    let genre = if rule_based.confidence > neural.confidence {
        rule_based.genre.clone()
    } else {
        neural.genre.clone()
    };

    GenreDecision {
        genre,
        confidence: rule_based.confidence.max(neural.confidence),
        probabilities,
        source: GenreSource::Blended,
    }
}
