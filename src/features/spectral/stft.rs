//! Short-time Fourier transform
//!
//! Produces the magnitude surface every other descriptor is derived from.
//!
//! Frames are centered: the signal is zero-padded by `n_fft / 2` on both sides,
//! so frame `t` is centered on sample `t * hop_size` and a signal of `n` samples
//! yields `1 + n / hop_size` frames. Each frame is multiplied by a periodic Hann
//! window before the FFT; only the `n_fft / 2 + 1` non-negative bins are kept.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;

use crate::error::AnalysisError;

/// Magnitude spectrogram (frames × bins)
#[derive(Debug, Clone)]
pub struct Spectrogram {
    frames: Vec<Vec<f32>>,
    sample_rate: u32,
    n_fft: usize,
    hop_size: usize,
}

impl Spectrogram {
    /// Magnitude frames, `frames()[t][k]` is bin `k` of frame `t`
    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }

    /// Number of time frames
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Number of frequency bins per frame (`n_fft / 2 + 1`)
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Sample rate of the analysed signal
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// FFT size
    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Hop size in samples
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Frame rate in frames per second
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.hop_size as f32
    }

    /// Center frequency of bin `k` in Hz
    pub fn bin_frequency(&self, k: usize) -> f32 {
        k as f32 * self.sample_rate as f32 / self.n_fft as f32
    }

    /// Center frequencies of all bins in Hz
    pub fn frequencies(&self) -> Vec<f32> {
        (0..self.n_bins()).map(|k| self.bin_frequency(k)).collect()
    }

    /// Per-bin magnitude averaged over time
    pub fn mean_magnitude(&self) -> Vec<f32> {
        let mut mean = vec![0.0f32; self.n_bins()];
        if self.frames.is_empty() {
            return mean;
        }
        for frame in &self.frames {
            for (acc, &m) in mean.iter_mut().zip(frame.iter()) {
                *acc += m;
            }
        }
        let scale = 1.0 / self.frames.len() as f32;
        for m in &mut mean {
            *m *= scale;
        }
        mean
    }

    /// Copy with every frame multiplied bin-wise by `weights`
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `weights` does not have one entry per bin.
    pub fn weighted(&self, weights: &[f32]) -> Result<Spectrogram, AnalysisError> {
        if weights.len() != self.n_bins() {
            return Err(AnalysisError::InvalidInput(format!(
                "Weight curve has {} entries, spectrogram has {} bins",
                weights.len(),
                self.n_bins()
            )));
        }
        let frames = self
            .frames
            .iter()
            .map(|frame| frame.iter().zip(weights).map(|(&m, &w)| m * w).collect())
            .collect();
        Ok(Spectrogram {
            frames,
            sample_rate: self.sample_rate,
            n_fft: self.n_fft,
            hop_size: self.hop_size,
        })
    }
}

/// Compute the magnitude STFT of a mono signal
///
/// # Arguments
///
/// * `samples` - Mono samples
/// * `sample_rate` - Sample rate in Hz
/// * `n_fft` - FFT / window size (typically 2048)
/// * `hop_size` - Hop size in samples (typically 512)
///
/// # Returns
///
/// `Spectrogram` with `1 + samples.len() / hop_size` frames. An empty signal
/// yields a single all-zero frame.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if any parameter is zero.
pub fn compute_stft(
    samples: &[f32],
    sample_rate: u32,
    n_fft: usize,
    hop_size: usize,
) -> Result<Spectrogram, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid sample rate: 0".to_string(),
        ));
    }
    if n_fft == 0 || hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "FFT size and hop size must be > 0".to_string(),
        ));
    }

    let n_frames = 1 + samples.len() / hop_size;
    let n_bins = n_fft / 2 + 1;
    let pad = n_fft / 2;

    log::debug!(
        "Computing STFT: {} samples at {} Hz, n_fft={}, hop={}, {} frames",
        samples.len(),
        sample_rate,
        n_fft,
        hop_size,
        n_frames
    );

    let window = hann_window(n_fft);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
    let mut frames = Vec::with_capacity(n_frames);

    for t in 0..n_frames {
        let center = t * hop_size;
        for (i, slot) in buffer.iter_mut().enumerate() {
            // Index into the zero-padded signal
            let sample = (center + i)
                .checked_sub(pad)
                .and_then(|idx| samples.get(idx))
                .copied()
                .unwrap_or(0.0);
            *slot = Complex::new(sample * window[i], 0.0);
        }
        fft.process(&mut buffer);
        frames.push(buffer[..n_bins].iter().map(|c| c.norm()).collect());
    }

    Ok(Spectrogram {
        frames,
        sample_rate,
        n_fft,
        hop_size,
    })
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / size as f32).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_frame_count_and_shape() {
        let samples = vec![0.0f32; 22050];
        let spec = compute_stft(&samples, 22050, 2048, 512).unwrap();
        assert_eq!(spec.n_frames(), 1 + 22050 / 512);
        assert_eq!(spec.n_bins(), 1025);
        assert!(spec.frames().iter().all(|f| f.len() == 1025));
    }

    #[test]
    fn test_empty_signal_is_zero() {
        let spec = compute_stft(&[], 22050, 2048, 512).unwrap();
        assert_eq!(spec.n_frames(), 1);
        assert!(spec.frames()[0].iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_sine_peak_bin() {
        let sr = 22050;
        let spec = compute_stft(&sine(1000.0, sr, 1.0), sr, 2048, 512).unwrap();
        let mean = spec.mean_magnitude();
        let peak_bin = mean
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(k, _)| k)
            .unwrap();
        let peak_freq = spec.bin_frequency(peak_bin);
        assert!(
            (peak_freq - 1000.0).abs() < 15.0,
            "peak at {:.1} Hz, expected ~1000 Hz",
            peak_freq
        );
    }

    #[test]
    fn test_weighted_scales_bins() {
        let sr = 22050;
        let spec = compute_stft(&sine(440.0, sr, 0.5), sr, 1024, 256).unwrap();
        let weights = vec![2.0f32; spec.n_bins()];
        let doubled = spec.weighted(&weights).unwrap();
        let a: f32 = spec.mean_magnitude().iter().sum();
        let b: f32 = doubled.mean_magnitude().iter().sum();
        assert!((b - 2.0 * a).abs() < 1e-3 * b.max(1.0));

        assert!(spec.weighted(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_invalid_params() {
        assert!(compute_stft(&[0.0; 10], 0, 2048, 512).is_err());
        assert!(compute_stft(&[0.0; 10], 22050, 0, 512).is_err());
        assert!(compute_stft(&[0.0; 10], 22050, 2048, 0).is_err());
    }
}
