//! Audio preprocessing modules
//!
//! This module contains utilities for preparing audio for analysis:
//! - Channel mixing (interleaved multi-channel to mono)
//! - Sample-rate conversion and true-peak oversampling

pub mod channel_mixer;
pub mod resample;
