//! Period estimation modules
//!
//! Convert an onset-strength envelope to a tempo:
//! - Autocorrelation with a tempo prior
//! - Perceptually weighted refinement and the baseline/refined policy

pub mod autocorrelation;
pub mod perceptual;

pub use perceptual::{detect_bpm, perceptual_weights, TempoEstimate};

/// BPM candidate with confidence
#[derive(Debug, Clone)]
pub struct BpmCandidate {
    /// BPM estimate
    pub bpm: f32,

    /// Confidence score (0.0-1.0), relative to the best candidate
    pub confidence: f32,
}
