//! Krumhansl-Kessler key templates
//!
//! Tonal profiles for the two modes, rooted on C and normalised to sum to 1.
//! Profiles for other roots are obtained by rotating the chroma profile rather
//! than the template.
//!
//! # Reference
//!
//! Krumhansl, C. L., & Kessler, E. J. (1982). Tracing the Dynamic Changes in Perceived
//! Tonal Organization in a Spatial Representation of Musical Keys. *Psychological Review*,
//! 89(4), 334-368.

/// C major probe-tone ratings
const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// C minor probe-tone ratings
const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Major and minor templates rooted on C
#[derive(Debug, Clone)]
pub struct KeyTemplates {
    /// C major template (sums to 1)
    pub major: [f32; 12],

    /// C minor template (sums to 1)
    pub minor: [f32; 12],
}

impl KeyTemplates {
    /// Create templates from the Krumhansl-Kessler profiles
    pub fn new() -> Self {
        Self {
            major: normalize_sum(&MAJOR_PROFILE),
            minor: normalize_sum(&MINOR_PROFILE),
        }
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_sum(profile: &[f32; 12]) -> [f32; 12] {
    let sum: f32 = profile.iter().sum();
    let mut out = [0.0f32; 12];
    for (o, &p) in out.iter_mut().zip(profile.iter()) {
        *o = p / sum;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_sum_to_one() {
        let t = KeyTemplates::new();
        assert!((t.major.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((t.minor.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_tonic_is_strongest() {
        let t = KeyTemplates::new();
        assert!(t.major.iter().all(|&v| v <= t.major[0]));
        assert!(t.minor.iter().all(|&v| v <= t.minor[0]));
    }
}
