//! Audio I/O modules
//!
//! Audio decoding using Symphonia and the immutable mono buffer every
//! analysis works on.

pub mod decoder;
pub mod sample_buffer;

pub use decoder::decode_audio;
pub use sample_buffer::AudioBuffer;
