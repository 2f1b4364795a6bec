//! Chroma vector extraction
//!
//! Folds the spectral peaks of each STFT frame onto 12 pitch classes.
//!
//! Only local maxima of the magnitude spectrum contribute. Each peak's
//! frequency is refined by parabolic interpolation over its neighbours and
//! its main-lobe power goes to the nearest semitone (`69 + 12 · log2(f / 440)`,
//! A4 = 440 Hz). Folding peaks rather than raw bins keeps the window's
//! main lobe from leaking a note into the neighbouring pitch classes.

use super::normalization::normalize_chroma_max;
use crate::features::spectral::Spectrogram;

/// Lowest frequency folded into chroma (C1)
const MIN_FREQ_HZ: f32 = 32.7;

/// Highest frequency folded into chroma
const MAX_FREQ_HZ: f32 = 5000.0;

/// Peaks more than 40 dB below the frame maximum are ignored
const PEAK_FLOOR_RATIO: f32 = 0.01;

/// Extract max-normalised chroma vectors from a magnitude spectrogram
///
/// # Arguments
///
/// * `spec` - Magnitude STFT
///
/// # Returns
///
/// One 12-element chroma vector per frame (index 0 = C, 1 = C#, ..., 11 = B),
/// each scaled so its largest element is 1. Silent frames stay all-zero.
pub fn extract_chroma(spec: &Spectrogram) -> Vec<Vec<f32>> {
    log::debug!(
        "Extracting chroma: {} frames at {} Hz",
        spec.n_frames(),
        spec.sample_rate()
    );

    let bin_hz = spec.sample_rate() as f32 / spec.n_fft().max(1) as f32;

    let raw: Vec<Vec<f32>> = spec
        .frames()
        .iter()
        .map(|frame| frame_chroma(frame, bin_hz))
        .collect();

    normalize_chroma_max(&raw)
}

fn frame_chroma(frame: &[f32], bin_hz: f32) -> Vec<f32> {
    let mut chroma = vec![0.0f32; 12];
    let max = frame.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 || frame.len() < 3 {
        return chroma;
    }
    let floor = max * PEAK_FLOOR_RATIO;

    for k in 1..frame.len() - 1 {
        let (left, center, right) = (frame[k - 1], frame[k], frame[k + 1]);
        if center < floor || center <= left || center < right {
            continue;
        }
        let freq = (k as f32 + parabolic_offset(left, center, right)) * bin_hz;
        if !(MIN_FREQ_HZ..=MAX_FREQ_HZ).contains(&freq) {
            continue;
        }
        let midi = 69.0 + 12.0 * (freq / 440.0).log2();
        let class = (midi.round() as i64).rem_euclid(12) as usize;
        // Main-lobe power is nearly independent of where the peak falls between bins
        chroma[class] += left * left + center * center + right * right;
    }
    chroma
}

/// Fractional offset of a peak's vertex from its center bin, in [-0.5, 0.5]
fn parabolic_offset(left: f32, center: f32, right: f32) -> f32 {
    let denom = left - 2.0 * center + right;
    if denom.abs() < 1e-12 {
        0.0
    } else {
        (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::spectral::compute_stft;
    use std::f32::consts::PI;

    fn chord(freqs: &[f32], sr: u32, seconds: f32) -> Vec<f32> {
        (0..(sr as f32 * seconds) as usize)
            .map(|i| {
                freqs
                    .iter()
                    .map(|&f| (2.0 * PI * f * i as f32 / sr as f32).sin())
                    .sum::<f32>()
                    / freqs.len() as f32
            })
            .collect()
    }

    #[test]
    fn test_a440_maps_to_a() {
        let sr = 22050;
        let spec = compute_stft(&chord(&[440.0], sr, 1.0), sr, 4096, 1024).unwrap();
        let chroma = extract_chroma(&spec);
        let mid = &chroma[chroma.len() / 2];
        let argmax = mid
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(argmax, 9, "chroma {:?}", mid);
        assert!((mid[9] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_c_major_triad_classes() {
        let sr = 22050;
        // C4, E4, G4
        let samples = chord(&[261.63, 329.63, 392.0], sr, 2.0);
        let spec = compute_stft(&samples, sr, 4096, 1024).unwrap();
        let chroma = extract_chroma(&spec);
        let mid = &chroma[chroma.len() / 2];
        for class in [0, 4, 7] {
            assert!(mid[class] > 0.3, "class {} weak: {:?}", class, mid);
        }
        assert!(mid[1] < 0.3 && mid[6] < 0.3, "chroma {:?}", mid);
    }

    #[test]
    fn test_triad_does_not_leak_into_neighbours() {
        // A3, C#4, E4 at the default analysis resolution
        let sr = 22050;
        let samples = chord(&[220.0, 277.18, 329.63], sr, 3.0);
        let spec = compute_stft(&samples, sr, 2048, 512).unwrap();
        let chroma = extract_chroma(&spec);

        let mut mean = [0.0f32; 12];
        for frame in &chroma {
            for (m, v) in mean.iter_mut().zip(frame) {
                *m += v / chroma.len() as f32;
            }
        }
        for class in [9, 1, 4] {
            assert!(mean[class] > 0.7, "chord tone {} weak: {:?}", class, mean);
        }
        for class in [0, 2, 3, 5, 8, 10] {
            assert!(mean[class] < 0.1, "class {} leaked: {:?}", class, mean);
        }
    }

    #[test]
    fn test_parabolic_offset() {
        assert_eq!(parabolic_offset(1.0, 2.0, 1.0), 0.0);
        assert!(parabolic_offset(1.0, 2.0, 1.5) > 0.0);
        assert!(parabolic_offset(1.5, 2.0, 1.0) < 0.0);
        assert_eq!(parabolic_offset(1.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn test_silence_is_zero() {
        let spec = compute_stft(&vec![0.0; 8192], 22050, 2048, 512).unwrap();
        let chroma = extract_chroma(&spec);
        assert!(chroma.iter().all(|c| c.len() == 12 && c.iter().all(|&v| v == 0.0)));
    }
}
