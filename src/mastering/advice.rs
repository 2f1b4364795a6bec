//! Rule-based mastering recommendations
//!
//! Each check inspects one part of a [`MasteringReport`] and emits a single
//! [`Advice`]. Genre-aware checks compare the genre name case-insensitively.

use serde::{Deserialize, Serialize};

use super::MasteringReport;

/// Streaming platforms normalise to roughly this level
const TARGET_LUFS: f32 = -14.0;

/// Quieter than this is flagged
const QUIET_LUFS: f32 = -16.0;

/// Louder than this is flagged
const LOUD_LUFS: f32 = -12.0;

/// True peaks above this leave too little headroom for lossy encoding
const PEAK_HEADROOM_DBFS: f32 = -0.3;

/// Acoustic genres whose masters should keep at least this crest factor
const ACOUSTIC_MIN_CREST_DB: f32 = 15.0;

const BASS_GENRES: &[&str] = &["EDM", "TECHNO", "TRAP", "DARK PHONK", "DRIFT PHONK"];
const GUITAR_GENRES: &[&str] = &["ROCK", "METAL"];
const ACOUSTIC_GENRES: &[&str] = &["JAZZ", "CLASSICAL"];

/// Severity of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceKind {
    /// Something to look at
    Warning,
    /// Something that will audibly hurt the master
    Error,
    /// Check passed
    Success,
}

/// A single mastering recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    /// Severity
    #[serde(rename = "type")]
    pub kind: AdviceKind,

    /// What was found
    pub message: String,

    /// What to do about it, if anything
    #[serde(default)]
    pub action: Option<String>,
}

impl Advice {
    fn new(kind: AdviceKind, message: impl Into<String>, action: Option<&str>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: action.map(str::to_string),
        }
    }

    fn warning(message: impl Into<String>, action: &str) -> Self {
        Self::new(AdviceKind::Warning, message, Some(action))
    }

    fn error(message: impl Into<String>, action: &str) -> Self {
        Self::new(AdviceKind::Error, message, Some(action))
    }

    fn success(message: impl Into<String>) -> Self {
        Self::new(AdviceKind::Success, message, None)
    }
}

fn loudness_advice(lufs: f32, genre: &str) -> Advice {
    if lufs < QUIET_LUFS {
        let message = format!("Loudness is low ({:.1} LUFS)", lufs);
        if BASS_GENRES.contains(&genre) {
            Advice::warning(
                message,
                "Boost the sub-bass around 40-60 Hz and raise the limiter ceiling for a punchier master",
            )
        } else if GUITAR_GENRES.contains(&genre) {
            Advice::warning(
                message,
                "Boost the mids around 1-3 kHz and push the limiter harder",
            )
        } else if ACOUSTIC_GENRES.contains(&genre) {
            Advice::warning(message, "Apply gentle gain; avoid heavy limiting to keep the dynamics")
        } else {
            Advice::warning(message, "Increase gain or use a limiter")
        }
    } else if lufs > LOUD_LUFS {
        let message = format!("Loudness is high ({:.1} LUFS)", lufs);
        if ACOUSTIC_GENRES.contains(&genre) {
            Advice::warning(message, "Relax the limiter to restore natural dynamics")
        } else {
            Advice::warning(
                message,
                &format!("Aim for about {:.0} LUFS for streaming platforms", TARGET_LUFS),
            )
        }
    } else {
        Advice::success(format!("Loudness is appropriate ({:.1} LUFS)", lufs))
    }
}

fn peak_advice(report: &MasteringReport) -> Advice {
    let dbfs = report.peak.dbfs;
    if report.peak.clipping {
        Advice::error(
            format!("Clipping detected (true peak {:.2} dBFS)", dbfs),
            "Reduce gain or use a limiter",
        )
    } else if dbfs > PEAK_HEADROOM_DBFS {
        Advice::warning(
            format!("True peak is very close to 0 dBFS ({:.2} dBFS)", dbfs),
            "Set the limiter ceiling to -1 dBFS to leave headroom for encoding",
        )
    } else {
        Advice::success("True peak level is safe")
    }
}

fn genre_balance_advice(report: &MasteringReport, genre: &str) -> Option<Advice> {
    let balance = &report.frequency_balance;
    if BASS_GENRES.contains(&genre) && balance.low_db_diff < -3.0 {
        Some(Advice::warning(
            format!("{} usually needs a stronger low end", genre),
            "Boost the sub-bass around 40-60 Hz",
        ))
    } else if GUITAR_GENRES.contains(&genre) && balance.mid_db_diff < -3.0 {
        Some(Advice::warning(
            format!("{} usually needs more midrange presence", genre),
            "Boost the mids around 1-3 kHz",
        ))
    } else if genre == "POP" && balance.high_db_diff < -2.0 {
        Some(Advice::warning(
            "Pop usually needs more sparkle in the highs",
            "Add a high shelf above 8 kHz",
        ))
    } else {
        None
    }
}

fn dynamics_advice(report: &MasteringReport, genre: &str) -> Advice {
    let transients = &report.transients;
    let acoustic = ACOUSTIC_GENRES.contains(&genre);
    if transients.over_compressed {
        let message = format!(
            "Over-compressed (crest factor {:.1} dB)",
            transients.crest_factor_db
        );
        if acoustic {
            Advice::error(message, "Remove or relax bus compression and limiting")
        } else {
            Advice::warning(message, "Reduce compression or limiting to restore transients")
        }
    } else if acoustic && transients.crest_factor_db < ACOUSTIC_MIN_CREST_DB {
        Advice::warning(
            format!(
                "Dynamics are somewhat narrow for {} (crest factor {:.1} dB)",
                genre, transients.crest_factor_db
            ),
            "Use lighter compression to preserve the natural dynamic range",
        )
    } else {
        Advice::success("Dynamics are well preserved")
    }
}

/// Generate recommendations for a mastering report
///
/// # Arguments
///
/// * `report` - Measurements (its `recommendations` field is ignored)
/// * `genre` - Detected genre, if known; enables genre-specific checks
///
/// # Returns
///
/// Loudness and peak advice first, then genre balance, balance warnings and dynamics.
pub fn generate_advice(report: &MasteringReport, genre: Option<&str>) -> Vec<Advice> {
    let genre = genre.map(str::to_uppercase).unwrap_or_default();

    let mut advice = vec![loudness_advice(report.lufs, &genre), peak_advice(report)];

    advice.extend(genre_balance_advice(report, &genre));

    for warning in &report.frequency_balance.warnings {
        advice.push(Advice::warning(
            warning.clone(),
            "Correct the frequency balance with EQ",
        ));
    }

    advice.push(dynamics_advice(report, &genre));

    log::debug!(
        "Generated {} recommendations (genre: {})",
        advice.len(),
        if genre.is_empty() { "unknown" } else { &genre }
    );

    advice
}
