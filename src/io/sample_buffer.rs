//! Immutable mono sample buffer

use crate::error::AnalysisError;

/// Mono audio samples at a fixed sample rate
///
/// Samples are expected in roughly [-1.0, 1.0]. The buffer cannot be mutated
/// once built; derived buffers (resampled, truncated) are new values.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Wrap mono samples
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `sample_rate` is 0.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Invalid sample rate: 0".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Sample data
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// True if every sample is exactly zero (or the buffer is empty)
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }

    /// Copy of the first `max_secs` seconds
    pub fn truncated(&self, max_secs: f32) -> AudioBuffer {
        let max_len = (max_secs.max(0.0) * self.sample_rate as f32) as usize;
        let end = self.samples.len().min(max_len);
        Self {
            samples: self.samples[..end].to_vec(),
            sample_rate: self.sample_rate,
        }
    }

    /// Copy converted to `target_rate`
    pub fn resampled(&self, target_rate: u32) -> Result<AudioBuffer, AnalysisError> {
        let samples =
            crate::preprocessing::resample::resample(&self.samples, self.sample_rate, target_rate)?;
        AudioBuffer::new(samples, target_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_rejected() {
        assert!(AudioBuffer::new(vec![0.0; 10], 0).is_err());
    }

    #[test]
    fn test_truncated() {
        let buffer = AudioBuffer::new(vec![0.5; 22050 * 3], 22050).unwrap();
        let head = buffer.truncated(1.0);
        assert_eq!(head.len(), 22050);
        assert_eq!(head.sample_rate(), 22050);
        // Longer than the buffer: unchanged
        assert_eq!(buffer.truncated(10.0).len(), buffer.len());
    }

    #[test]
    fn test_silence() {
        assert!(AudioBuffer::new(vec![], 44100).unwrap().is_silent());
        assert!(AudioBuffer::new(vec![0.0; 100], 44100).unwrap().is_silent());
        assert!(!AudioBuffer::new(vec![0.0, 0.1], 44100).unwrap().is_silent());
    }

    #[test]
    fn test_duration() {
        let buffer = AudioBuffer::new(vec![0.0; 48000], 48000).unwrap();
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-6);
    }
}
