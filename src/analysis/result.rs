//! Analysis result types

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::features::period::TempoEstimate;
use crate::genre::GenreSource;
use crate::mastering::MasteringReport;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => f.write_str("Major"),
            Mode::Minor => f.write_str("Minor"),
        }
    }
}

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Pitch class of the tonic (0-11)
    pub fn root(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }

    /// Tonic note name (e.g. "C#")
    pub fn tonic(&self) -> &'static str {
        NOTE_NAMES[self.root() as usize]
    }

    /// Major or minor
    pub fn mode(&self) -> Mode {
        match self {
            Key::Major(_) => Mode::Major,
            Key::Minor(_) => Mode::Minor,
        }
    }

    /// Key name as reported (e.g. "C Major", "F# Minor")
    ///
    /// # Example
    ///
    /// ```
    /// use acoustic_profile::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C Major");
    /// assert_eq!(Key::Minor(9).name(), "A Minor");
    /// ```
    pub fn name(&self) -> String {
        format!("{} {}", self.tonic(), self.mode())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic(), self.mode())
    }
}

impl FromStr for Key {
    type Err = AnalysisError;

    /// Parse "C# Minor" / "A Major", or the short forms "C#m" / "A"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AnalysisError::InvalidInput(format!("Invalid key: {:?}", s));
        let s = s.trim();

        let (note, minor) = match s.split_once(' ') {
            Some((note, mode)) if mode.eq_ignore_ascii_case("major") => (note, false),
            Some((note, mode)) if mode.eq_ignore_ascii_case("minor") => (note, true),
            Some(_) => return Err(invalid()),
            None => match s.strip_suffix('m') {
                Some(note) => (note, true),
                None => (s, false),
            },
        };

        let root = NOTE_NAMES
            .iter()
            .position(|n| n.eq_ignore_ascii_case(note))
            .ok_or_else(invalid)? as u32;

        Ok(if minor { Key::Minor(root) } else { Key::Major(root) })
    }
}

/// Mean and standard deviation of each MFCC coefficient over time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MfccStats {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

/// Per-pitch-class chroma statistics over time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChromaStats {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
    pub variance: Vec<f32>,
}

/// Everything the feature path measures for one buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Tempo decision and both intermediate estimates
    pub tempo: TempoEstimate,

    /// Best-correlating key
    pub key: Key,

    /// Pearson correlation of the key template (-1 to 1)
    pub key_correlation: f32,

    /// 0-100
    pub energy: f32,

    /// 0-100
    pub loudness: f32,

    /// Mean spectral centroid in Hz
    pub spectral_centroid: f32,

    /// Mean 85 % rolloff frequency in Hz
    pub spectral_rolloff: f32,

    /// Mean zero-crossing rate (crossings per sample)
    pub zero_crossing_rate: f32,

    pub mfcc: MfccStats,

    pub chroma: ChromaStats,

    /// Strided, max-normalised mean magnitude spectrum for display
    pub spectral_magnitude: Vec<f32>,
}

/// Final acoustic profile of a track
///
/// Always well formed: on a load failure every numeric field is zeroed and
/// `error` is set. Scalars are rounded for display (BPM, energy, loudness and
/// centroid to one decimal, genre confidence to two).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticReport {
    pub bpm: f32,

    /// e.g. "A Minor", or "Unknown" on failure
    pub key: String,

    pub energy: f32,

    pub loudness: f32,

    pub spectral_centroid: f32,

    pub spectral_magnitude: Vec<f32>,

    pub genre: String,

    pub genre_confidence: f32,

    pub genre_probabilities: BTreeMap<String, f32>,

    /// Which classifier decided the genre; absent on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre_source: Option<GenreSource>,

    /// Transcribed lyrics, empty when no transcriber is available
    pub lyrics: String,

    pub mastering: MasteringReport,

    /// Full feature vector, absent on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,

    /// Set only when the audio could not be loaded or analysed at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AcousticReport {
    /// Sentinel report for a failed analysis
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            bpm: 0.0,
            key: "Unknown".to_string(),
            energy: 0.0,
            loudness: 0.0,
            spectral_centroid: 0.0,
            spectral_magnitude: Vec::new(),
            genre: "Unknown".to_string(),
            genre_confidence: 0.0,
            genre_probabilities: BTreeMap::new(),
            genre_source: None,
            lyrics: String::new(),
            mastering: MasteringReport::unavailable(),
            features: None,
            error: Some(error.into()),
        }
    }

    /// True if this is a failure sentinel
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Round to `decimals` places; non-finite values become 0
pub fn round_to(value: f32, decimals: i32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10f64.powi(decimals);
    ((value as f64 * scale).round() / scale) as f32
}
