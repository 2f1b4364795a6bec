//! Feature path and result assembly
//!
//! - Feature extraction over the (truncated) feature-rate buffer
//! - Result types
//! - Lyrics transcription capability

pub mod result;
pub mod transcription;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::chroma::{chroma_stats, extract_chroma};
use crate::features::dynamics::{centroid_summary, energy_score, loudness_score};
use crate::features::key::{detect_key, KeyTemplates};
use crate::features::period::detect_bpm;
use crate::features::spectral::descriptors::{
    frame_rms, magnitude_preview, mean, spectral_rolloff, zero_crossing_rate,
};
use crate::features::spectral::mel::{compute_mfcc, mfcc_stats};
use crate::features::spectral::{compute_stft, Spectrogram};
use crate::io::AudioBuffer;

use result::FeatureVector;

/// Feature vector plus the spectrogram it was computed from
///
/// The spectrogram is kept so the neural classifier can build its surface
/// without a second STFT.
#[derive(Debug, Clone)]
pub struct FeatureAnalysis {
    pub features: FeatureVector,
    pub spectrogram: Spectrogram,
}

/// Run the feature path on a mono buffer
///
/// The buffer is resampled to `config.feature_sample_rate` and truncated to
/// `config.max_feature_duration_secs` before analysis.
///
/// # Arguments
///
/// * `buffer` - Mono buffer at any rate
/// * `config` - Analysis configuration
///
/// # Errors
///
/// Returns `AnalysisError` if resampling fails or a parameter is invalid.
pub fn extract_features(
    buffer: &AudioBuffer,
    config: &AnalysisConfig,
) -> Result<FeatureAnalysis, AnalysisError> {
    let buffer = buffer
        .resampled(config.feature_sample_rate)?
        .truncated(config.max_feature_duration_secs);
    let samples = buffer.samples();

    log::debug!(
        "Feature analysis: {} samples at {} Hz ({:.2}s)",
        samples.len(),
        buffer.sample_rate(),
        buffer.duration_secs()
    );

    let spec = compute_stft(samples, buffer.sample_rate(), config.frame_size, config.hop_size)?;

    let tempo = detect_bpm(&spec, config)?;

    let chroma = extract_chroma(&spec);
    let key = detect_key(&chroma, &KeyTemplates::default())?;

    let rms = frame_rms(samples, config.frame_size, config.hop_size)?;
    let zcr = zero_crossing_rate(samples, config.frame_size, config.hop_size)?;
    let mfcc = compute_mfcc(&spec, config.n_mels, config.n_mfcc)?;

    let features = FeatureVector {
        tempo,
        key: key.key,
        key_correlation: key.correlation,
        energy: energy_score(&rms),
        loudness: loudness_score(&rms),
        spectral_centroid: centroid_summary(&spec),
        spectral_rolloff: mean(&spectral_rolloff(&spec, config.rolloff_percent)),
        zero_crossing_rate: mean(&zcr),
        mfcc: mfcc_stats(&mfcc),
        chroma: chroma_stats(&chroma),
        spectral_magnitude: magnitude_preview(&spec.mean_magnitude(), config.spectrum_bins),
    };

    log::debug!(
        "Features: {:.1} BPM, {}, energy {:.1}, loudness {:.1}, centroid {:.1} Hz",
        features.tempo.bpm,
        features.key,
        features.energy,
        features.loudness,
        features.spectral_centroid
    );

    Ok(FeatureAnalysis {
        features,
        spectrogram: spec,
    })
}
