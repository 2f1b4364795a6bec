//! Genre classification
//!
//! - Signature database of qualitative genre archetypes
//! - Weighted-distance matcher with the phonk/trap bass boost
//! - Optional neural classifier and its fusion with the matcher

pub mod classifier;
pub mod matcher;
#[cfg(feature = "ml")]
pub mod onnx;
pub mod signatures;

pub use classifier::{fuse, GenreClassifier, GenreDecision, GenreSource, NeuralClassifier, NeuralPrediction};
pub use matcher::{classify_rule_based, match_genres, GenreMatch, MatchInput, RuleBasedResult};
pub use signatures::{BeatStructure, GenreSignature, Level, SignatureDatabase};
