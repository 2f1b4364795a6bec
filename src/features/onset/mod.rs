//! Onset detection modules
//!
//! - Spectral flux onset-strength envelope
//! - Onset event picking (local maximum + adaptive threshold)

pub mod peaks;
pub mod spectral_flux;

pub use peaks::pick_onset_frames;
pub use spectral_flux::onset_strength;
