//! ONNX Runtime backend for the neural genre classifier (feature `ml`)
//!
//! The model takes a `[1, 128, 128, 1]` float tensor (mel rows, time columns,
//! channel) and returns one softmax score per label.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use super::classifier::{GenreClassifier, NeuralClassifier, NEURAL_LABELS};
use crate::error::AnalysisError;
use crate::features::spectral::FeatureSurface;

/// Genre classifier backed by an ONNX model
pub struct OnnxGenreClassifier {
    session: Mutex<Session>,
    labels: Vec<String>,
}

impl OnnxGenreClassifier {
    /// Load a model with the default phonk/ambient labels
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Unavailable` if the file is missing and
    /// `AnalysisError::ProcessingError` if ONNX Runtime rejects it.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        Self::load_with_labels(path, NEURAL_LABELS.iter().map(|s| s.to_string()).collect())
    }

    /// Load a model whose outputs correspond to `labels`
    ///
    /// # Errors
    ///
    /// See [`OnnxGenreClassifier::load`].
    pub fn load_with_labels(path: &Path, labels: Vec<String>) -> Result<Self, AnalysisError> {
        if !path.exists() {
            return Err(AnalysisError::Unavailable(format!(
                "Genre model not found: {}",
                path.display()
            )));
        }

        log::debug!("Loading ONNX genre model from {}", path.display());
        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| AnalysisError::ProcessingError(format!("Failed to load genre model: {}", e)))?;

        Ok(Self {
            session: Mutex::new(session),
            labels,
        })
    }
}

impl GenreClassifier for OnnxGenreClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, surface: &FeatureSurface) -> Result<Vec<f32>, AnalysisError> {
        let input = Array4::from_shape_vec(
            (1, surface.rows(), surface.cols(), 1),
            surface.data().to_vec(),
        )
        .map_err(|e| AnalysisError::ProcessingError(format!("Model input shape error: {}", e)))?;

        let tensor = Tensor::from_array(input)
            .map_err(|e| AnalysisError::ProcessingError(format!("Tensor creation error: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| AnalysisError::ProcessingError("Genre model lock poisoned".to_string()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| AnalysisError::ProcessingError("Genre model has no inputs".to_string()))?;

        let outputs = session
            .run(ort::inputs![input_name => tensor])
            .map_err(|e| AnalysisError::ProcessingError(format!("Inference error: {}", e)))?;

        let (_, value) = outputs
            .iter()
            .next()
            .ok_or_else(|| AnalysisError::ProcessingError("Genre model produced no output".to_string()))?;

        let (_shape, scores) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| AnalysisError::ProcessingError(format!("Output extraction error: {}", e)))?;

        Ok(scores.to_vec())
    }
}

/// Resolve the neural capability from a model path
///
/// A missing or unloadable model yields [`NeuralClassifier::Unavailable`].
pub fn load_neural_classifier(path: &Path) -> NeuralClassifier {
    match OnnxGenreClassifier::load(path) {
        Ok(classifier) => NeuralClassifier::available(classifier),
        Err(e) => {
            log::info!("Neural genre classifier unavailable: {}", e);
            NeuralClassifier::Unavailable
        }
    }
}
