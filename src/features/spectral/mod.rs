//! Spectral frontend
//!
//! Everything downstream reads from these:
//! - STFT magnitude surface (2048 / 512 at the feature rate)
//! - Frame descriptors: RMS, centroid, rolloff, zero-crossing rate
//! - Mel filterbank, MFCC and the classifier feature surface

pub mod descriptors;
pub mod mel;
pub mod stft;

pub use mel::FeatureSurface;
pub use stft::{compute_stft, Spectrogram};
