//! Feature extraction modules
//!
//! This module contains the feature-path algorithms:
//! - Spectral frontend (STFT, descriptors, mel/MFCC)
//! - Onset strength and onset picking
//! - Period estimation (perceptually weighted BPM)
//! - Chroma extraction
//! - Key detection
//! - Energy / loudness / centroid summaries

pub mod chroma;
pub mod dynamics;
pub mod key;
pub mod onset;
pub mod period;
pub mod spectral;
