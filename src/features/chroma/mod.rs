//! Chroma extraction modules
//!
//! Extract pitch-class distribution (12 semitones) from the STFT:
//! - Chroma vector computation
//! - Per-frame normalization and summary statistics

pub mod extractor;
pub mod normalization;

pub use extractor::extract_chroma;
pub use normalization::{chroma_stats, mean_chroma};
