//! Channel mixing utilities (multi-channel to mono conversion)

use crate::error::AnalysisError;

/// Average interleaved frames down to mono
///
/// # Arguments
///
/// * `interleaved` - Interleaved samples `[c0, c1, ..., c0, c1, ...]`
/// * `channels` - Number of channels per frame
///
/// # Returns
///
/// One sample per frame, the arithmetic mean of the frame's channels.
/// A trailing partial frame is dropped.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `channels` is 0.
pub fn downmix_interleaved(interleaved: &[f32], channels: usize) -> Result<Vec<f32>, AnalysisError> {
    if channels == 0 {
        return Err(AnalysisError::InvalidInput(
            "Channel count must be > 0".to_string(),
        ));
    }

    if channels == 1 {
        return Ok(interleaved.to_vec());
    }

    let scale = 1.0 / channels as f32;
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_average() {
        let interleaved = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        let mono = downmix_interleaved(&interleaved, 2).unwrap();
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_mono_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix_interleaved(&samples, 1).unwrap(), samples);
    }

    #[test]
    fn test_partial_frame_dropped() {
        let mono = downmix_interleaved(&[0.2, 0.4, 0.6, 0.8, 1.0], 2).unwrap();
        assert_eq!(mono.len(), 2);
    }

    #[test]
    fn test_zero_channels() {
        assert!(downmix_interleaved(&[0.0], 0).is_err());
    }
}
