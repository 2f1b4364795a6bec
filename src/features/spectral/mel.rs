//! Mel filterbank, MFCC and the classifier feature surface

use super::descriptors::{mean, std_dev};
use super::stft::Spectrogram;
use crate::analysis::result::MfccStats;
use crate::error::AnalysisError;

/// Floor of the decibel scale used for the feature surface, relative to the peak
const TOP_DB: f32 = 80.0;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Triangular mel filterbank over the bins of one STFT configuration
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<Vec<(usize, f32)>>,
}

impl MelFilterbank {
    /// Build `n_mels` triangular filters spanning `[f_min, f_max]` Hz
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for zero bands, a zero sample rate
    /// or a zero FFT size.
    pub fn new(
        n_mels: usize,
        n_fft: usize,
        sample_rate: u32,
        f_min: f32,
        f_max: f32,
    ) -> Result<Self, AnalysisError> {
        if n_mels == 0 || n_fft == 0 || sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid mel filterbank: {} bands, n_fft={}, {} Hz",
                n_mels, n_fft, sample_rate
            )));
        }

        let nyquist = sample_rate as f32 * 0.5;
        let f_max = f_max.min(nyquist).max(f_min);
        let mel_min = hz_to_mel(f_min);
        let mel_max = hz_to_mel(f_max);

        let bins: Vec<usize> = (0..n_mels + 2)
            .map(|i| {
                let t = i as f32 / (n_mels + 1) as f32;
                let hz = mel_to_hz(mel_min + (mel_max - mel_min) * t).clamp(0.0, nyquist);
                (((hz * n_fft as f32) / sample_rate as f32).floor() as usize).min(n_fft / 2)
            })
            .collect();

        let filters = (0..n_mels)
            .map(|m| triangle(bins[m], bins[m + 1], bins[m + 2].max(bins[m + 1] + 1)))
            .collect();

        Ok(Self { filters })
    }

    /// Number of mel bands
    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Mel-band energies of one power spectrum
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| {
                filter
                    .iter()
                    .map(|&(bin, w)| power.get(bin).copied().unwrap_or(0.0) * w)
                    .sum()
            })
            .collect()
    }
}

fn triangle(left: usize, center: usize, right: usize) -> Vec<(usize, f32)> {
    (left..=right)
        .filter_map(|bin| {
            let w = if bin < center {
                (bin - left) as f32 / (center - left) as f32
            } else if right == center {
                0.0
            } else {
                (right - bin) as f32 / (right - center) as f32
            };
            (w > 0.0).then_some((bin, w))
        })
        .collect()
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// Mel power spectrogram (frames × mel bands)
///
/// # Errors
///
/// Propagates filterbank construction errors.
pub fn mel_spectrogram(spec: &Spectrogram, n_mels: usize) -> Result<Vec<Vec<f32>>, AnalysisError> {
    let bank = MelFilterbank::new(
        n_mels,
        spec.n_fft(),
        spec.sample_rate(),
        0.0,
        spec.sample_rate() as f32 / 2.0,
    )?;
    Ok(spec
        .frames()
        .iter()
        .map(|frame| {
            let power: Vec<f32> = frame.iter().map(|&m| m * m).collect();
            bank.apply(&power)
        })
        .collect())
}

/// Power to decibels, `10 * log10(max(x, 1e-10))`
pub fn power_to_db(power: f32) -> f32 {
    10.0 * power.max(1e-10).log10()
}

/// Mel-frequency cepstral coefficients per frame (frames × `n_mfcc`)
///
/// DCT-II (orthonormal) of the log-mel spectrum.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `n_mfcc` is 0 or exceeds `n_mels`.
pub fn compute_mfcc(
    spec: &Spectrogram,
    n_mels: usize,
    n_mfcc: usize,
) -> Result<Vec<Vec<f32>>, AnalysisError> {
    if n_mfcc == 0 || n_mfcc > n_mels {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid MFCC count {} for {} mel bands",
            n_mfcc, n_mels
        )));
    }

    let mel = mel_spectrogram(spec, n_mels)?;
    let mfcc: Vec<Vec<f32>> = mel
        .iter()
        .map(|bands| {
            let log_mel: Vec<f32> = bands.iter().map(|&p| power_to_db(p)).collect();
            dct_ii_ortho(&log_mel, n_mfcc)
        })
        .collect();

    log::debug!(
        "Computed {} MFCC frames ({} coefficients from {} mel bands)",
        mfcc.len(),
        n_mfcc,
        n_mels
    );
    Ok(mfcc)
}

fn dct_ii_ortho(values: &[f32], count: usize) -> Vec<f32> {
    let n = values.len().max(1) as f64;
    (0..count)
        .map(|k| {
            let sum: f64 = values
                .iter()
                .enumerate()
                .map(|(m, &v)| {
                    let angle = std::f64::consts::PI * k as f64 * (m as f64 + 0.5) / n;
                    v as f64 * angle.cos()
                })
                .sum();
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (sum * scale) as f32
        })
        .collect()
}

/// Per-coefficient mean and standard deviation over time
pub fn mfcc_stats(mfcc: &[Vec<f32>]) -> MfccStats {
    let n_coeffs = mfcc.first().map(|f| f.len()).unwrap_or(0);
    let mut means = Vec::with_capacity(n_coeffs);
    let mut stds = Vec::with_capacity(n_coeffs);
    for c in 0..n_coeffs {
        let track: Vec<f32> = mfcc.iter().map(|frame| frame[c]).collect();
        means.push(mean(&track));
        stds.push(std_dev(&track));
    }
    MfccStats {
        mean: means,
        std: stds,
    }
}

/// Normalised mel image fed to the neural genre classifier
///
/// `rows` mel bands by `cols` time steps, row-major. Decibel values are
/// floored 80 dB below the loudest cell and min-max scaled onto [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSurface {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl FeatureSurface {
    /// Build a surface of `n_mels × width` from a spectrogram
    ///
    /// The time axis is resampled to `width` columns by linear interpolation.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `width` is 0; propagates
    /// filterbank errors.
    pub fn from_spectrogram(
        spec: &Spectrogram,
        n_mels: usize,
        width: usize,
    ) -> Result<Self, AnalysisError> {
        if width == 0 {
            return Err(AnalysisError::InvalidInput(
                "Feature surface width must be > 0".to_string(),
            ));
        }

        let mel = mel_spectrogram(spec, n_mels)?;
        let db: Vec<Vec<f32>> = mel
            .iter()
            .map(|bands| bands.iter().map(|&p| power_to_db(p)).collect())
            .collect();
        let peak = db
            .iter()
            .flat_map(|f| f.iter().copied())
            .fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - TOP_DB;

        let n_frames = db.len();
        let mut data = vec![0.0f32; n_mels * width];
        for col in 0..width {
            let pos = if width > 1 && n_frames > 1 {
                col as f32 * (n_frames - 1) as f32 / (width - 1) as f32
            } else {
                0.0
            };
            let i0 = (pos.floor() as usize).min(n_frames.saturating_sub(1));
            let i1 = (i0 + 1).min(n_frames.saturating_sub(1));
            let frac = pos - i0 as f32;
            for row in 0..n_mels {
                let v = db[i0][row] * (1.0 - frac) + db[i1][row] * frac;
                data[row * width + col] = v.max(floor);
            }
        }

        // Min-max normalisation onto [0, 1]
        let lo = data.iter().copied().fold(f32::INFINITY, f32::min);
        let hi = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        for v in &mut data {
            *v = ((*v - lo) / (hi - lo + EPSILON)).clamp(0.0, 1.0);
        }

        Ok(Self {
            data,
            rows: n_mels,
            cols: width,
        })
    }

    /// Row-major values
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of mel rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of time columns
    pub fn cols(&self) -> usize {
        self.cols
    }
}
