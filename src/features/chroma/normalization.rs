//! Chroma normalization and summary statistics

use crate::analysis::result::ChromaStats;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Scale each chroma vector so its largest element is 1
///
/// Vectors whose maximum is below epsilon are returned unchanged (silence
/// stays zero). The result is invariant to the input's overall gain.
pub fn normalize_chroma_max(chroma_vectors: &[Vec<f32>]) -> Vec<Vec<f32>> {
    chroma_vectors
        .iter()
        .map(|chroma| {
            let max = chroma.iter().copied().fold(0.0f32, f32::max);
            if max > EPSILON {
                chroma.iter().map(|&v| v / max).collect()
            } else {
                chroma.clone()
            }
        })
        .collect()
}

/// Average chroma over time into a 12-bin pitch-class profile
pub fn mean_chroma(chroma_vectors: &[Vec<f32>]) -> [f32; 12] {
    let mut profile = [0.0f32; 12];
    if chroma_vectors.is_empty() {
        return profile;
    }
    for chroma in chroma_vectors {
        for (acc, &v) in profile.iter_mut().zip(chroma.iter()) {
            *acc += v;
        }
    }
    let scale = 1.0 / chroma_vectors.len() as f32;
    for v in &mut profile {
        *v *= scale;
    }
    profile
}

/// Per-pitch-class mean, standard deviation and variance over time
pub fn chroma_stats(chroma_vectors: &[Vec<f32>]) -> ChromaStats {
    let mean = mean_chroma(chroma_vectors);
    let mut variance = [0.0f32; 12];
    if !chroma_vectors.is_empty() {
        for chroma in chroma_vectors {
            for (c, acc) in variance.iter_mut().enumerate() {
                let d = chroma.get(c).copied().unwrap_or(0.0) - mean[c];
                *acc += d * d;
            }
        }
        let scale = 1.0 / chroma_vectors.len() as f32;
        for v in &mut variance {
            *v *= scale;
        }
    }
    ChromaStats {
        mean: mean.to_vec(),
        std: variance.iter().map(|v| v.sqrt()).collect(),
        variance: variance.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_max() {
        let out = normalize_chroma_max(&[vec![0.0, 2.0, 4.0], vec![0.0; 3]]);
        assert_eq!(out[0], vec![0.0, 0.5, 1.0]);
        assert_eq!(out[1], vec![0.0; 3]);
    }

    #[test]
    fn test_stats() {
        let mut a = vec![0.0f32; 12];
        let mut b = vec![0.0f32; 12];
        a[0] = 1.0;
        b[0] = 0.0;
        b[7] = 1.0;
        let stats = chroma_stats(&[a, b]);
        assert!((stats.mean[0] - 0.5).abs() < 1e-6);
        assert!((stats.variance[0] - 0.25).abs() < 1e-6);
        assert!((stats.std[7] - 0.5).abs() < 1e-6);
        assert_eq!(stats.mean.len(), 12);
    }

    #[test]
    fn test_empty() {
        assert_eq!(mean_chroma(&[]), [0.0; 12]);
        let stats = chroma_stats(&[]);
        assert!(stats.variance.iter().all(|&v| v == 0.0));
    }
}
