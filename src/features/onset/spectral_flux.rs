//! Spectral flux onset strength
//!
//! The onset-strength envelope drives tempo estimation and transient counting.
//!
//! Algorithm:
//! 1. Compress each magnitude bin: `C[t][k] = ln(1 + γ · M[t][k])`
//! 2. Half-wave rectified difference between consecutive frames
//! 3. Average over bins: `O[t] = mean_k max(0, C[t][k] - C[t-1][k])`
//!
//! The first frame has no predecessor and gets strength 0.

/// Log compression gain
const COMPRESSION_GAMMA: f32 = 100.0;

/// Onset-strength envelope of a magnitude spectrogram (frames × bins)
///
/// # Arguments
///
/// * `magnitudes` - Magnitude spectrogram, one `Vec` per frame
///
/// # Returns
///
/// One non-negative value per frame. Silence yields all zeros.
pub fn onset_strength(magnitudes: &[Vec<f32>]) -> Vec<f32> {
    if magnitudes.is_empty() {
        return Vec::new();
    }

    log::debug!(
        "Computing spectral flux onset strength: {} frames × {} bins",
        magnitudes.len(),
        magnitudes[0].len()
    );

    let compressed: Vec<Vec<f32>> = magnitudes
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|&m| (1.0 + COMPRESSION_GAMMA * m.max(0.0)).ln())
                .collect()
        })
        .collect();

    let mut envelope = Vec::with_capacity(compressed.len());
    envelope.push(0.0);
    for pair in compressed.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let n_bins = curr.len().min(prev.len());
        if n_bins == 0 {
            envelope.push(0.0);
            continue;
        }
        let flux: f32 = curr
            .iter()
            .zip(prev.iter())
            .map(|(&c, &p)| (c - p).max(0.0))
            .sum();
        envelope.push(flux / n_bins as f32);
    }

    envelope
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_detects_energy_jump() {
        let mut frames = vec![vec![0.0f32; 64]; 10];
        for frame in frames.iter_mut().skip(5) {
            frame.iter_mut().for_each(|m| *m = 1.0);
        }
        let env = onset_strength(&frames);
        assert_eq!(env.len(), 10);
        let peak = env
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 5);
        // Sustained energy produces no further flux
        assert!(env[6..].iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn test_decay_is_ignored() {
        let frames = vec![vec![1.0f32; 8], vec![0.5f32; 8], vec![0.0f32; 8]];
        let env = onset_strength(&frames);
        assert!(env.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty_and_silent() {
        assert!(onset_strength(&[]).is_empty());
        let env = onset_strength(&vec![vec![0.0f32; 16]; 4]);
        assert!(env.iter().all(|&v| v == 0.0));
    }
}
