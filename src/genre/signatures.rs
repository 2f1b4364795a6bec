//! Genre signature database
//!
//! Each signature is a qualitative archetype: a tempo range plus ordered
//! levels for band energy and dynamics. The matcher maps levels onto numeric
//! anchors (see [`Level::centroid_hz`], [`Level::band_db`], [`Level::crest_db`]).
//!
//! The built-in table is constructed once and shared read-only. Hosts can
//! build their own with [`SignatureDatabase::new`] or load one from JSON.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Ordered qualitative level
///
/// `"balanced"` is accepted as an alias of `"medium"` when deserialising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    VeryLow,
    Low,
    #[serde(alias = "balanced")]
    Medium,
    High,
    VeryHigh,
}

impl Level {
    /// Expected spectral centroid for a high-band level, in Hz
    pub fn centroid_hz(self) -> f32 {
        match self {
            Level::VeryLow | Level::Low => 1500.0,
            Level::Medium => 2000.0,
            Level::High => 2500.0,
            Level::VeryHigh => 3500.0,
        }
    }

    /// Expected band level over the pink reference, in dB
    pub fn band_db(self) -> f32 {
        match self {
            Level::VeryLow | Level::Low => -2.0,
            Level::Medium => 0.0,
            Level::High => 2.0,
            Level::VeryHigh => 5.0,
        }
    }

    /// Expected crest factor for a dynamic-range level, in dB
    pub fn crest_db(self) -> f32 {
        match self {
            Level::VeryLow => 7.0,
            Level::Low => 10.0,
            Level::Medium => 12.0,
            Level::High => 15.0,
            Level::VeryHigh => 18.0,
        }
    }
}

/// Rhythmic skeleton of a genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatStructure {
    /// Steady kick on every beat
    #[serde(alias = "4/4")]
    FourOnTheFloor,
    /// Anything else
    Variable,
}

/// Qualitative archetype of one genre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreSignature {
    /// Display name, unique within a database (compared case-insensitively)
    pub name: String,
    /// Inclusive tempo range in BPM
    pub bpm_range: (f32, f32),
    /// Energy below 200 Hz
    pub sub_bass: Level,
    pub beat: BeatStructure,
    /// Energy 200 Hz - 5 kHz
    pub mid: Level,
    /// Energy above 5 kHz, also drives the expected centroid
    pub high: Level,
    pub transient_density: Level,
    /// Drives the expected crest factor
    pub dynamic_range: Level,
    /// Presence boost in the 1-5 kHz vocal range
    pub vocal_boost: bool,
    pub description: String,
}

impl GenreSignature {
    /// Center of the tempo range
    pub fn expected_bpm(&self) -> f32 {
        (self.bpm_range.0 + self.bpm_range.1) / 2.0
    }
}

/// Immutable collection of genre signatures
///
/// Serialises as a plain JSON array; deserialising goes through
/// [`SignatureDatabase::new`], so an invalid table is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GenreSignature>", into = "Vec<GenreSignature>")]
pub struct SignatureDatabase {
    signatures: Vec<GenreSignature>,
}

impl TryFrom<Vec<GenreSignature>> for SignatureDatabase {
    type Error = AnalysisError;

    fn try_from(signatures: Vec<GenreSignature>) -> Result<Self, Self::Error> {
        Self::new(signatures)
    }
}

impl From<SignatureDatabase> for Vec<GenreSignature> {
    fn from(database: SignatureDatabase) -> Self {
        database.signatures
    }
}

impl SignatureDatabase {
    /// Build a database from signatures
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the list is empty, a name repeats
    /// (case-insensitively) or a tempo range is inverted.
    pub fn new(signatures: Vec<GenreSignature>) -> Result<Self, AnalysisError> {
        if signatures.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Signature database is empty".to_string(),
            ));
        }
        for (i, sig) in signatures.iter().enumerate() {
            if !(sig.bpm_range.0 <= sig.bpm_range.1) {
                return Err(AnalysisError::InvalidInput(format!(
                    "Invalid BPM range for {}: {:?}",
                    sig.name, sig.bpm_range
                )));
            }
            if signatures[..i]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&sig.name))
            {
                return Err(AnalysisError::InvalidInput(format!(
                    "Duplicate genre signature: {}",
                    sig.name
                )));
            }
        }
        Ok(Self { signatures })
    }

    /// Parse and validate a JSON array of signatures
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` on malformed JSON or an invalid table.
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let signatures: Vec<GenreSignature> = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidInput(format!("Invalid signature JSON: {}", e)))?;
        Self::new(signatures)
    }

    /// The built-in table, initialised on first use
    pub fn builtin() -> &'static SignatureDatabase {
        static BUILTIN: OnceLock<SignatureDatabase> = OnceLock::new();
        BUILTIN.get_or_init(|| SignatureDatabase {
            signatures: builtin_signatures(),
        })
    }

    /// Look up a signature by name, ignoring ASCII case
    pub fn get(&self, name: &str) -> Option<&GenreSignature> {
        self.signatures
            .iter()
            .find(|sig| sig.name.eq_ignore_ascii_case(name))
    }

    /// All signatures in table order
    pub fn iter(&self) -> impl Iterator<Item = &GenreSignature> {
        self.signatures.iter()
    }

    /// Number of signatures
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Always false for a validated database
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl Default for SignatureDatabase {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

#[allow(clippy::too_many_arguments)]
fn sig(
    name: &str,
    bpm_range: (f32, f32),
    sub_bass: Level,
    beat: BeatStructure,
    mid: Level,
    high: Level,
    transient_density: Level,
    dynamic_range: Level,
    vocal_boost: bool,
    description: &str,
) -> GenreSignature {
    GenreSignature {
        name: name.to_string(),
        bpm_range,
        sub_bass,
        beat,
        mid,
        high,
        transient_density,
        dynamic_range,
        vocal_boost,
        description: description.to_string(),
    }
}

#[rustfmt::skip]
fn builtin_signatures() -> Vec<GenreSignature> {
    use BeatStructure::{FourOnTheFloor as Four, Variable as Var};
    use Level::{High as H, Low as L, Medium as M, VeryHigh as VH, VeryLow as VL};

    vec![
        sig("EDM", (120.0, 130.0), H, Four, M, H, H, L, false,
            "Club-oriented electronic music with a driving four-on-the-floor kick, strong sub-bass and bright top end"),
        sig("Techno", (120.0, 140.0), VH, Four, L, M, VH, VL, false,
            "Relentless machine groove built on a pounding kick and hypnotic synth sequences"),
        sig("Rock", (80.0, 160.0), M, Var, VH, H, VH, M, true,
            "Distorted guitars and a live drum kit with a forward, energetic midrange"),
        sig("Metal", (100.0, 200.0), H, Var, VH, VH, VH, M, true,
            "Heavily distorted guitars, double-kick drumming and aggressive vocals"),
        sig("Hip-Hop", (70.0, 90.0), VH, Var, L, H, M, M, true,
            "Laid-back beats with heavy 808 bass and rhythmic vocal delivery"),
        sig("Trap", (140.0, 160.0), VH, Var, L, VH, H, L, true,
            "Booming 808s under rapid hi-hat rolls and a dark atmosphere"),
        sig("Pop", (90.0, 120.0), M, Four, M, H, M, L, true,
            "Polished, evenly balanced production with bright vocals and tight compression"),
        sig("Jazz", (60.0, 180.0), L, Var, M, M, L, VH, false,
            "Acoustic ensemble playing with extended harmony and wide natural dynamics"),
        sig("Classical", (40.0, 200.0), L, Var, M, M, L, VH, false,
            "Orchestral and chamber music recorded with natural acoustics and minimal compression"),
        sig("Dark Phonk", (120.0, 140.0), VH, Var, L, M, H, L, false,
            "Distorted 808 bass, cowbell melodies and murky lo-fi textures"),
        sig("Drift Phonk", (140.0, 160.0), VH, Var, L, H, VH, L, false,
            "Fast, aggressive phonk with saturated bass built for street racing"),
        sig("Ambient", (60.0, 100.0), L, Var, L, L, VL, H, false,
            "Sparse, atmospheric soundscapes with little or no percussion"),
        sig("Soul_RnB", (70.0, 100.0), M, Var, H, M, L, M, true,
            "Smooth vocals over warm keys and a groovy bassline"),
        sig("Reggaeton_Latin", (90.0, 100.0), VH, Var, M, H, H, L, true,
            "Dembow rhythm with synthetic percussion and a tropical feel"),
        sig("Funk_Disco", (110.0, 130.0), H, Four, H, H, H, M, true,
            "Slap bass, rhythm guitar and a steady dance kick with horn stabs"),
        sig("Synthwave_Retrowave", (100.0, 120.0), H, Four, M, H, M, M, false,
            "Eighties-style analog synths and drum machines with a retro-futurist mood"),
        sig("LoFi_HipHop", (70.0, 90.0), L, Var, L, VL, VL, M, false,
            "Dusty, muted beats with vinyl crackle and mellow keys"),
        sig("Drum_and_Bass", (170.0, 180.0), VH, Var, M, H, VH, L, false,
            "Fast breakbeats over deep, rolling basslines"),
        sig("Hyperpop", (140.0, 180.0), H, Var, VH, VH, VH, VL, true,
            "Maximalist, glitchy pop with pitched vocals and heavily clipped synths"),
        sig("Country_Folk", (60.0, 120.0), L, Var, H, M, L, H, true,
            "Acoustic and steel guitars carrying story-driven vocals"),
        sig("Blues", (60.0, 120.0), L, Var, H, M, L, H, true,
            "Twelve-bar progressions with expressive guitar and raw vocals"),
        sig("Dubstep_Riddim", (140.0, 150.0), VH, Var, VH, H, VH, VL, false,
            "Half-time drums under wobbling, growling bass drops"),
        sig("City_Pop_Japan", (100.0, 120.0), H, Four, H, H, M, M, true,
            "Glossy eighties Japanese pop with funk grooves and FM synths"),
        sig("J_Pop_Modern", (120.0, 160.0), H, Var, H, VH, VH, L, true,
            "High-energy idol pop with bright synths and dense arrangements"),
        sig("Anime_Epic_Hybrid", (80.0, 160.0), H, Var, VH, H, VH, H, true,
            "Orchestral rock with cinematic drums and soaring heroic themes"),
        sig("J_Rock", (120.0, 180.0), M, Var, VH, H, VH, M, true,
            "Fast, melodic guitar rock with high-register vocals"),
        sig("Baroque_Classical", (60.0, 120.0), L, Var, H, M, L, VH, false,
            "Contrapuntal chamber music with harpsichord and strings"),
        sig("K_Pop_Performance", (120.0, 140.0), VH, Var, H, VH, VH, VL, true,
            "Genre-hopping dance pop with punchy synth bass and stacked vocal harmonies"),
        sig("Afrobeats", (100.0, 120.0), H, Var, H, H, H, M, true,
            "West African percussive grooves with melodic bass and bright textures"),
        sig("Bossa_Nova", (80.0, 120.0), L, Var, M, M, VL, H, false,
            "Nylon-string guitar and soft percussion with jazz-inflected harmony"),
        sig("Future_Bass", (140.0, 160.0), VH, Var, H, VH, VH, L, true,
            "Detuned supersaw chords, vocal chops and hard-hitting trap drums"),
        sig("Hardstyle", (140.0, 150.0), VH, Four, VH, H, VH, VL, false,
            "Distorted, pitched kicks with euphoric leads and rave energy"),
    ]
}
