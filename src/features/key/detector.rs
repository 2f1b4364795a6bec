//! Key detection algorithm
//!
//! Averages chroma over time, then correlates the profile against the
//! Krumhansl-Kessler templates for all 24 keys.
//!
//! For each root `r` in chromatic order (C, C#, ..., B) the profile is rotated
//! so that `r` lands on index 0, then its Pearson correlation with the major
//! template and then the minor template is computed. The first strictly greater
//! score wins, so ties resolve to the earlier root and to major over minor.

use super::{templates::KeyTemplates, KeyDetectionResult};
use crate::analysis::result::Key;
use crate::error::AnalysisError;
use crate::features::chroma::mean_chroma;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Detect musical key from chroma vectors
///
/// # Arguments
///
/// * `chroma_vectors` - 12-element chroma vectors (one per frame)
/// * `templates` - Key templates (Krumhansl-Kessler profiles)
///
/// # Returns
///
/// Key detection result with the best key, its correlation and all 24 scores.
/// A silent profile has zero correlation with every key and resolves to C major.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the chroma vectors are empty or not
/// 12-dimensional.
pub fn detect_key(
    chroma_vectors: &[Vec<f32>],
    templates: &KeyTemplates,
) -> Result<KeyDetectionResult, AnalysisError> {
    log::debug!("Detecting key from {} chroma vectors", chroma_vectors.len());

    if chroma_vectors.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Empty chroma vectors".to_string(),
        ));
    }

    for (i, chroma) in chroma_vectors.iter().enumerate() {
        if chroma.len() != 12 {
            return Err(AnalysisError::InvalidInput(format!(
                "Chroma vector at index {} has {} elements, expected 12",
                i,
                chroma.len()
            )));
        }
    }

    let profile = mean_chroma(chroma_vectors);
    Ok(detect_key_from_profile(&profile, templates))
}

/// Detect key from an already averaged pitch-class profile
pub fn detect_key_from_profile(profile: &[f32; 12], templates: &KeyTemplates) -> KeyDetectionResult {
    let mut best_key = Key::Major(0);
    let mut best_score = -1.0f32;
    let mut all_scores = Vec::with_capacity(24);

    for root in 0..12u32 {
        let rotated: [f32; 12] = std::array::from_fn(|j| profile[(j + root as usize) % 12]);

        for (key, template) in [
            (Key::Major(root), &templates.major),
            (Key::Minor(root), &templates.minor),
        ] {
            let score = pearson_correlation(&rotated, template);
            all_scores.push((key, score));
            if score > best_score {
                best_score = score;
                best_key = key;
            }
        }
    }

    log::debug!("Detected key: {} (correlation {:.3})", best_key, best_score);

    KeyDetectionResult {
        key: best_key,
        correlation: best_score,
        all_scores,
    }
}

/// Pearson correlation of two 12-element profiles, 0 if either has no variance
fn pearson_correlation(a: &[f32; 12], b: &[f32; 12]) -> f32 {
    let mean_a = a.iter().sum::<f32>() / 12.0;
    let mean_b = b.iter().sum::<f32>() / 12.0;

    let mut cov = 0.0f32;
    let mut var_a = 0.0f32;
    let mut var_b = 0.0f32;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom < EPSILON {
        0.0
    } else {
        cov / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_for(root: usize, template: &[f32; 12]) -> Vec<f32> {
        // Template rooted on `root`
        (0..12).map(|j| template[(j + 12 - root) % 12]).collect()
    }

    #[test]
    fn test_recovers_every_major_and_minor_key() {
        let templates = KeyTemplates::new();
        for root in 0..12 {
            let major = profile_for(root, &templates.major);
            let result = detect_key(&[major], &templates).unwrap();
            assert_eq!(result.key, Key::Major(root as u32));
            assert!((result.correlation - 1.0).abs() < 1e-4);

            let minor = profile_for(root, &templates.minor);
            let result = detect_key(&[minor], &templates).unwrap();
            assert_eq!(result.key, Key::Minor(root as u32));
        }
    }

    #[test]
    fn test_scaling_invariance() {
        let templates = KeyTemplates::new();
        let base = profile_for(9, &templates.minor);
        let key = detect_key(&[base.clone()], &templates).unwrap().key;
        for scale in [0.001f32, 0.5, 3.0, 1000.0] {
            let scaled: Vec<f32> = base.iter().map(|v| v * scale).collect();
            assert_eq!(detect_key(&[scaled], &templates).unwrap().key, key);
        }
    }

    #[test]
    fn test_silent_profile_is_c_major() {
        let templates = KeyTemplates::new();
        let result = detect_key(&vec![vec![0.0; 12]; 4], &templates).unwrap();
        assert_eq!(result.key, Key::Major(0));
        assert_eq!(result.correlation, 0.0);
        assert_eq!(result.all_scores.len(), 24);
    }

    #[test]
    fn test_invalid_input() {
        let templates = KeyTemplates::new();
        assert!(detect_key(&[], &templates).is_err());
        assert!(detect_key(&[vec![0.0; 11]], &templates).is_err());
    }

    #[test]
    fn test_pearson() {
        let a: [f32; 12] = std::array::from_fn(|i| i as f32);
        let b: [f32; 12] = std::array::from_fn(|i| 2.0 * i as f32 + 1.0);
        let c: [f32; 12] = std::array::from_fn(|i| -(i as f32));
        assert!((pearson_correlation(&a, &b) - 1.0).abs() < 1e-5);
        assert!((pearson_correlation(&a, &c) + 1.0).abs() < 1e-5);
        assert_eq!(pearson_correlation(&a, &[1.0; 12]), 0.0);
    }
}
