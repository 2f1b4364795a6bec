//! Weighted-distance genre matcher
//!
//! For every signature an *expected* vector is derived from its qualitative
//! levels and compared with the *observed* vector:
//!
//! | # | Dimension | Expected value | Normalisation (defaults) |
//! |---|-----------|----------------|--------------------------|
//! | 0 | BPM | center of the tempo range | `(x - 60) / 140` |
//! | 1 | Spectral centroid | from the high-band level | `x / 5000` |
//! | 2 | Low band dB | from the sub-bass level | `(x + 5) / 10` |
//! | 3 | Mid band dB | from the mid level | `(x + 5) / 10` |
//! | 4 | High band dB | from the high-band level | `(x + 5) / 10` |
//! | 5 | Crest factor | from the dynamic-range level | `x / 20` |
//!
//! Normalised values are not clamped, so out-of-range inputs still order
//! sensibly. `distance = sqrt(Σ (w_i · Δ_i)²)` and
//! `confidence = exp(-decay · distance)`, which is exactly 1.0 at distance 0.
//!
//! Bass-heavy material in the phonk/trap tempo band then boosts the phonk and
//! trap signatures (capped at 1.0) before the final sort.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::signatures::{GenreSignature, SignatureDatabase};
use crate::config::MatcherConfig;

/// Crest factor assumed when the measured one is not finite
const FALLBACK_CREST_DB: f32 = 10.0;

/// Observed values the matcher compares against each signature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchInput {
    /// Tempo in BPM
    pub bpm: f32,
    /// Mean spectral centroid in Hz
    pub spectral_centroid: f32,
    /// Low band over the pink reference in dB
    pub low_db_diff: f32,
    /// Mid band over the pink reference in dB
    pub mid_db_diff: f32,
    /// High band over the pink reference in dB
    pub high_db_diff: f32,
    /// Crest factor in dB
    pub crest_factor_db: f32,
}

impl MatchInput {
    /// Replace non-finite measurements with neutral values
    ///
    /// BPM, centroid and band differences fall back to 0, the crest factor to 10 dB.
    pub fn sanitized(&self) -> Self {
        let or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        Self {
            bpm: or(self.bpm, 0.0),
            spectral_centroid: or(self.spectral_centroid, 0.0),
            low_db_diff: or(self.low_db_diff, 0.0),
            mid_db_diff: or(self.mid_db_diff, 0.0),
            high_db_diff: or(self.high_db_diff, 0.0),
            crest_factor_db: or(self.crest_factor_db, FALLBACK_CREST_DB),
        }
    }

    /// The anchor vector of a signature, expressed as an input
    ///
    /// Matching this input against the same signature gives distance 0.
    pub fn expected_for(signature: &GenreSignature) -> Self {
        Self {
            bpm: signature.expected_bpm(),
            spectral_centroid: signature.high.centroid_hz(),
            low_db_diff: signature.sub_bass.band_db(),
            mid_db_diff: signature.mid.band_db(),
            high_db_diff: signature.high.band_db(),
            crest_factor_db: signature.dynamic_range.crest_db(),
        }
    }

    fn normalized(&self, config: &MatcherConfig) -> [f32; 6] {
        let (bpm_lo, bpm_hi) = config.bpm_span;
        let db = |x: f32| (x + config.db_window) / (2.0 * config.db_window);
        [
            (self.bpm - bpm_lo) / (bpm_hi - bpm_lo),
            self.spectral_centroid / config.centroid_scale,
            db(self.low_db_diff),
            db(self.mid_db_diff),
            db(self.high_db_diff),
            self.crest_factor_db / config.crest_scale,
        ]
    }
}

/// Confidence for one genre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreMatch {
    /// Signature name
    pub genre: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

/// Outcome of rule-based matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBasedResult {
    /// Best-matching genre
    pub genre: String,
    /// Raw confidence of the best match
    pub confidence: f32,
    /// Confidence per genre, normalised to sum to 1 unless disabled in the config
    pub probabilities: BTreeMap<String, f32>,
    /// All matches, best first
    pub matches: Vec<GenreMatch>,
}

/// Weighted Euclidean distance between an input and a signature's anchors
pub fn signature_distance(input: &MatchInput, signature: &GenreSignature, config: &MatcherConfig) -> f32 {
    let observed = input.sanitized().normalized(config);
    let expected = MatchInput::expected_for(signature).normalized(config);
    let weights = config.weights.as_array();

    observed
        .iter()
        .zip(expected.iter())
        .zip(weights.iter())
        .map(|((&o, &e), &w)| {
            let d = w * (o - e);
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// True if the phonk/trap boost applies to this input
pub fn boost_applies(input: &MatchInput, config: &MatcherConfig) -> bool {
    let input = input.sanitized();
    let (lo, hi) = config.boost.bpm_range;
    input.bpm >= lo && input.bpm <= hi && input.low_db_diff > config.boost.min_low_db
}

/// Score every signature in the database
///
/// # Arguments
///
/// * `input` - Observed features (non-finite values are sanitised)
/// * `database` - Signatures to score
/// * `config` - Weights, normalisation constants and boost
///
/// # Returns
///
/// One match per signature, sorted by confidence (descending, ties in table order).
pub fn match_genres(input: &MatchInput, database: &SignatureDatabase, config: &MatcherConfig) -> Vec<GenreMatch> {
    let mut matches: Vec<GenreMatch> = database
        .iter()
        .map(|signature| {
            let distance = signature_distance(input, signature, config);
            let confidence = (-config.decay_scale * distance).exp();
            log::trace!(
                "{}: distance {:.4}, confidence {:.4}",
                signature.name,
                distance,
                confidence
            );
            GenreMatch {
                genre: signature.name.clone(),
                confidence,
            }
        })
        .collect();

    if boost_applies(input, config) {
        for m in matches.iter_mut() {
            if config
                .boost
                .genres
                .iter()
                .any(|g| g.eq_ignore_ascii_case(&m.genre))
            {
                m.confidence = (m.confidence * config.boost.factor).min(1.0);
            }
        }
        log::debug!(
            "Bass boost applied ({:.1} BPM, low band {:+.1} dB)",
            input.bpm,
            input.low_db_diff
        );
    }

    matches.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    matches
}

/// Probability map from matches
///
/// Normalised to sum to 1 when `normalize` is set and the total is positive.
pub fn probability_map(matches: &[GenreMatch], normalize: bool) -> BTreeMap<String, f32> {
    let total: f32 = matches.iter().map(|m| m.confidence).sum();
    let scale = if normalize && total > 0.0 { 1.0 / total } else { 1.0 };
    matches
        .iter()
        .map(|m| (m.genre.clone(), m.confidence * scale))
        .collect()
}

/// Match and summarise: best genre, its raw confidence and the probability map
pub fn classify_rule_based(
    input: &MatchInput,
    database: &SignatureDatabase,
    config: &MatcherConfig,
) -> RuleBasedResult {
    let matches = match_genres(input, database, config);
    let probabilities = probability_map(&matches, config.normalize_probabilities);
    let (genre, confidence) = matches
        .first()
        .map(|m| (m.genre.clone(), m.confidence))
        .unwrap_or_else(|| ("Unknown".to_string(), 0.0));

    log::debug!(
        "Rule-based genre: {} ({:.3}) from {} signatures",
        genre,
        confidence,
        matches.len()
    );

    RuleBasedResult {
        genre,
        confidence,
        probabilities,
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> &'static SignatureDatabase {
        SignatureDatabase::builtin()
    }

    fn input(bpm: f32, centroid: f32, low: f32, mid: f32, high: f32, crest: f32) -> MatchInput {
        MatchInput {
            bpm,
            spectral_centroid: centroid,
            low_db_diff: low,
            mid_db_diff: mid,
            high_db_diff: high,
            crest_factor_db: crest,
        }
    }

    #[test]
    fn test_every_signature_scored_once() {
        let config = MatcherConfig::default();
        let matches = match_genres(&input(128.0, 2500.0, 2.0, 0.0, 2.0, 10.0), db(), &config);
        assert_eq!(matches.len(), db().len());
        for sig in db().iter() {
            assert_eq!(matches.iter().filter(|m| m.genre == sig.name).count(), 1);
        }
        assert!(matches.iter().all(|m| (0.0..=1.0).contains(&m.confidence)));
        assert!(matches.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_exact_anchor_gives_full_confidence() {
        let config = MatcherConfig::default();
        for sig in db().iter() {
            let anchor = MatchInput::expected_for(sig);
            assert_eq!(signature_distance(&anchor, sig, &config), 0.0, "{}", sig.name);
        }

        // Ambient's anchor is outside the boost band, so its top score is unboosted
        let ambient = db().get("Ambient").unwrap();
        let matches = match_genres(&MatchInput::expected_for(ambient), db(), &config);
        let score = matches.iter().find(|m| m.genre == "Ambient").unwrap();
        assert_eq!(score.confidence, 1.0);
    }

    #[test]
    fn test_edm_anchor_ranks_edm_first() {
        let config = MatcherConfig::default();
        let edm = db().get("EDM").unwrap();
        let matches = match_genres(&MatchInput::expected_for(edm), db(), &config);
        assert_eq!(matches[0].genre, "EDM");
    }

    #[test]
    fn test_bass_boost_conditions() {
        let config = MatcherConfig::default();
        assert!(boost_applies(&input(140.0, 2000.0, 4.0, 0.0, 0.0, 10.0), &config));
        assert!(boost_applies(&input(130.0, 2000.0, 3.1, 0.0, 0.0, 10.0), &config));
        assert!(boost_applies(&input(150.0, 2000.0, 3.1, 0.0, 0.0, 10.0), &config));
        assert!(!boost_applies(&input(129.9, 2000.0, 6.0, 0.0, 0.0, 10.0), &config));
        assert!(!boost_applies(&input(140.0, 2000.0, 3.0, 0.0, 0.0, 10.0), &config));
    }

    #[test]
    fn test_bass_boost_raises_and_caps() {
        let config = MatcherConfig::default();
        let bass_heavy = input(140.0, 2500.0, 5.0, -2.0, 2.0, 10.0);
        let mut no_boost = config.clone();
        no_boost.boost.factor = 1.0;

        let boosted = match_genres(&bass_heavy, db(), &config);
        let plain = match_genres(&bass_heavy, db(), &no_boost);

        let find = |ms: &[GenreMatch], g: &str| {
            ms.iter().find(|m| m.genre == g).map(|m| m.confidence).unwrap_or(0.0)
        };
        for genre in ["Dark Phonk", "Drift Phonk", "Trap"] {
            let expected = (find(&plain, genre) * 1.3).min(1.0);
            assert!((find(&boosted, genre) - expected).abs() < 1e-6, "{}", genre);
            assert!(find(&boosted, genre) <= 1.0);
        }
        assert_eq!(find(&boosted, "Techno"), find(&plain, "Techno"));

        // Drift Phonk anchor (150 BPM, +5 dB low) sits inside the boost band
        let drift = MatchInput::expected_for(db().get("Drift Phonk").unwrap());
        let matches = match_genres(&drift, db(), &config);
        assert_eq!(find(&matches, "Drift Phonk"), 1.0);
        assert_eq!(matches[0].confidence, 1.0);
        assert!(["Trap", "Drift Phonk"].contains(&matches[0].genre.as_str()));
    }

    #[test]
    fn test_non_finite_inputs_are_sanitized() {
        let config = MatcherConfig::default();
        let bad = input(f32::NAN, 2000.0, f32::NEG_INFINITY, f32::NAN, f32::INFINITY, f32::NAN);
        let matches = match_genres(&bad, db(), &config);
        assert!(matches.iter().all(|m| m.confidence.is_finite()));

        let clean = bad.sanitized();
        assert_eq!(clean.low_db_diff, 0.0);
        assert_eq!(clean.crest_factor_db, 10.0);
    }

    #[test]
    fn test_probability_map_sums_to_one() {
        let config = MatcherConfig::default();
        let result = classify_rule_based(&input(95.0, 1800.0, 0.0, 1.0, -1.0, 13.0), db(), &config);
        let total: f32 = result.probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-4, "sum {}", total);
        assert_eq!(result.probabilities.len(), db().len());
        assert_eq!(result.genre, result.matches[0].genre);
        // Raw top confidence, not the normalised share
        assert!(result.confidence > result.probabilities[&result.genre]);
    }

    #[test]
    fn test_unnormalized_map_keeps_raw_values() {
        let mut config = MatcherConfig::default();
        config.normalize_probabilities = false;
        let result = classify_rule_based(&input(95.0, 1800.0, 0.0, 1.0, -1.0, 13.0), db(), &config);
        assert_eq!(result.probabilities[&result.genre], result.confidence);
    }
}
