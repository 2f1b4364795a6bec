//! Error types for the acoustic profiling engine

use thiserror::Error;

/// Errors that can occur during audio analysis
///
/// Never returned past the public analysis entry points. A load or
/// feature-path failure becomes the report's `error` string; mastering and
/// classifier failures become the sentinel value of the stage that raised them.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Audio decoding error
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Processing error during analysis
    #[error("Processing error: {0}")]
    ProcessingError(String),

    /// Numerical error (overflow, underflow, etc.)
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// An optional collaborator (model file, external program) is not present
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl From<symphonia::core::errors::Error> for AnalysisError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AnalysisError::DecodingError(err.to_string())
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::DecodingError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let err = AnalysisError::InvalidInput("empty buffer".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty buffer");

        let err = AnalysisError::Unavailable("model missing".to_string());
        assert_eq!(err.to_string(), "Unavailable: model missing");
    }

    #[test]
    fn test_io_error_maps_to_decoding() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: AnalysisError = io.into();
        assert!(matches!(err, AnalysisError::DecodingError(_)));
    }
}
