//! Key detection modules
//!
//! Detect musical key using:
//! - Krumhansl-Kessler templates (24 keys)
//! - Pearson correlation against the rotated pitch-class profile

pub mod detector;
pub mod templates;

pub use detector::{detect_key, detect_key_from_profile};
pub use templates::KeyTemplates;

use crate::analysis::result::Key;

/// Key detection result
#[derive(Debug, Clone)]
pub struct KeyDetectionResult {
    /// Detected key (best match)
    pub key: Key,

    /// Pearson correlation of the best match (-1.0 to 1.0)
    pub correlation: f32,

    /// All 24 key scores in search order (C major, C minor, C# major, ...)
    pub all_scores: Vec<(Key, f32)>,
}
