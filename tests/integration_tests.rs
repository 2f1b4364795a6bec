//! Integration tests for the acoustic profiling engine

use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use acoustic_profile::features::spectral::FeatureSurface;
use acoustic_profile::genre::classifier::NEURAL_LABELS;
use acoustic_profile::genre::{match_genres, MatchInput};
use acoustic_profile::mastering::AdviceKind;
use acoustic_profile::{
    analyze_audio, analyze_file, AnalysisConfig, AnalysisError, Analyzer, AudioBuffer,
    GenreClassifier, GenreSource, NeuralClassifier, SignatureDatabase,
};

/// Decaying 55 Hz kick on every beat
fn generate_kick_pattern(bpm: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let n = (seconds * sample_rate as f32) as usize;
    let beat_interval = (60.0 * sample_rate as f32 / bpm) as usize;
    (0..n)
        .map(|i| {
            let t = (i % beat_interval) as f32 / sample_rate as f32;
            0.8 * (2.0 * PI * 55.0 * t).sin() * (-t * 12.0).exp()
        })
        .collect()
}

fn generate_chord(freqs: &[f32], amplitude: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let n = (seconds * sample_rate as f32) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            freqs
                .iter()
                .map(|f| amplitude * (2.0 * PI * f * t).sin())
                .sum()
        })
        .collect()
}

/// Write mono samples as 16-bit PCM
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), Box<dyn std::error::Error>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

fn temp_wav(dir: &tempfile::TempDir, name: &str, samples: &[f32], sample_rate: u32) -> PathBuf {
    let path = dir.path().join(name);
    write_wav(&path, samples, sample_rate).expect("Failed to write WAV fixture");
    path
}

struct FixedClassifier {
    labels: Vec<String>,
    scores: Vec<f32>,
}

impl FixedClassifier {
    fn new(scores: [f32; 3]) -> Self {
        Self {
            labels: NEURAL_LABELS.iter().map(|s| s.to_string()).collect(),
            scores: scores.to_vec(),
        }
    }
}

impl GenreClassifier for FixedClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, surface: &FeatureSurface) -> Result<Vec<f32>, AnalysisError> {
        assert_eq!(surface.rows(), 128);
        assert_eq!(surface.cols(), 128);
        assert!(surface.data().iter().all(|v| (0.0..=1.0).contains(v)));
        Ok(self.scores.clone())
    }
}

#[test]
fn test_analyze_130bpm_kick_file() {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempfile::tempdir().unwrap();
    let path = temp_wav(&dir, "kick_130.wav", &generate_kick_pattern(130.0, 44100, 20.0), 44100);

    let report = analyze_file(&path);
    assert!(report.error.is_none(), "unexpected error: {:?}", report.error);

    assert!(
        (report.bpm - 130.0).abs() < 4.0,
        "BPM should be close to 130, got {:.1}",
        report.bpm
    );
    assert_eq!(report.spectral_magnitude.len(), 20);
    assert!(report.energy >= 0.0 && report.energy <= 100.0);
    assert!(report.loudness >= 0.0 && report.loudness <= 100.0);
    assert!(report.genre_confidence >= 0.0 && report.genre_confidence <= 1.0);
    assert_eq!(report.genre_source, Some(GenreSource::RuleBased));
    assert!(report.lyrics.is_empty());

    // Probability map covers the whole table and sums to 1
    assert_eq!(report.genre_probabilities.len(), SignatureDatabase::builtin().len());
    let total: f32 = report.genre_probabilities.values().sum();
    assert!((total - 1.0).abs() < 1e-3, "probabilities sum to {}", total);

    // Bass-heavy material in the phonk tempo band
    let mastering = &report.mastering;
    assert!(mastering.frequency_balance.low_db_diff > 3.0);
    let mut ranked: Vec<(&String, &f32)> = report.genre_probabilities.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(a.1));
    let top3: Vec<&str> = ranked.iter().take(3).map(|(g, _)| g.as_str()).collect();
    assert!(
        top3.iter().any(|g| ["Dark Phonk", "Drift Phonk", "Trap"].contains(g)),
        "top 3 genres: {:?}",
        top3
    );

    // Report-level invariants
    assert_eq!(mastering.peak.clipping, mastering.peak.dbfs > 0.0);
    assert_eq!(
        mastering.transients.over_compressed,
        mastering.transients.crest_factor_db < 10.0
    );
    assert!(mastering.transients.num_transients > 20);
    assert_eq!(mastering.frequency_balance.spectrum.len(), 64);
    assert!(!mastering.recommendations.is_empty());
}

#[test]
fn test_silence_is_not_an_error() {
    let buffer = AudioBuffer::new(vec![0.0; 44100 * 5], 44100).unwrap();
    let report = analyze_audio(&buffer);

    assert!(report.error.is_none());
    assert_eq!(report.loudness, 0.0);
    assert_eq!(report.energy, 0.0);
    assert_eq!(report.bpm, 0.0);
    assert_eq!(report.mastering.lufs, f32::NEG_INFINITY);
    assert!(!report.mastering.peak.clipping);

    // -inf serialises as null
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["mastering"]["lufs"].is_null());
    assert!(json.get("error").is_none());
}

#[test]
fn test_empty_buffer_does_not_panic() {
    let buffer = AudioBuffer::new(Vec::new(), 44100).unwrap();
    let report = analyze_audio(&buffer);
    assert_eq!(report.bpm, 0.0);
}

#[test]
fn test_missing_file_returns_sentinel_report() {
    let report = analyze_file(Path::new("/definitely/not/here.wav"));
    assert!(report.error.is_some());
    assert_eq!(report.bpm, 0.0);
    assert_eq!(report.key, "Unknown");
    assert_eq!(report.genre, "Unknown");
    assert_eq!(report.genre_confidence, 0.0);
    assert!(report.genre_probabilities.is_empty());
    assert!(report.spectral_magnitude.is_empty());
}

#[test]
fn test_corrupt_file_returns_sentinel_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.wav");
    std::fs::write(&path, b"RIFF this is not really a wave file").unwrap();

    let report = analyze_file(&path);
    assert!(report.error.is_some());
    assert_eq!(report.key, "Unknown");
}

#[test]
fn test_non_finite_samples_return_sentinel_report() {
    let mut samples = vec![0.1f32; 22050];
    samples[100] = f32::NAN;
    let report = analyze_audio(&AudioBuffer::new(samples, 22050).unwrap());
    assert!(report.error.is_some());
}

#[test]
fn test_stereo_wav_is_downmixed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 48000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for s in generate_chord(&[440.0], 0.5, 48000, 2.0) {
        let v = (s * i16::MAX as f32) as i16;
        writer.write_sample(v).unwrap();
        writer.write_sample(-v).unwrap();
    }
    writer.finalize().unwrap();

    // Opposite-phase channels cancel to silence
    let report = analyze_file(&path);
    assert!(report.error.is_none());
    assert_eq!(report.energy, 0.0);
    assert_eq!(report.mastering.lufs, f32::NEG_INFINITY);
}

#[test]
fn test_key_is_scale_invariant() {
    let triad = [261.63, 329.63, 392.0]; // C major
    let quiet = analyze_audio(&AudioBuffer::new(generate_chord(&triad, 0.05, 22050, 4.0), 22050).unwrap());
    let loud = analyze_audio(&AudioBuffer::new(generate_chord(&triad, 0.3, 22050, 4.0), 22050).unwrap());

    assert_eq!(quiet.key, "C Major");
    assert_eq!(quiet.key, loud.key);
    assert!(loud.loudness >= quiet.loudness);
}

#[test]
fn test_saturated_input_clamps_energy_and_loudness() {
    let square: Vec<f32> = (0..44100 * 3)
        .map(|i| if (i / 100) % 2 == 0 { 1.0 } else { -1.0 })
        .collect();
    let report = analyze_audio(&AudioBuffer::new(square, 44100).unwrap());

    assert_eq!(report.energy, 100.0);
    assert_eq!(report.loudness, 100.0);
    assert_eq!(report.mastering.peak.clipping, report.mastering.peak.dbfs > 0.0);
    assert!(report.mastering.transients.over_compressed);
    assert!(report
        .mastering
        .recommendations
        .iter()
        .any(|a| a.kind != AdviceKind::Success));
}

#[test]
fn test_confident_neural_classifier_decides() {
    let analyzer = Analyzer::new(AnalysisConfig::default())
        .unwrap()
        .with_classifier(NeuralClassifier::available(FixedClassifier::new([0.9, 0.05, 0.05])));

    let buffer = AudioBuffer::new(generate_kick_pattern(130.0, 22050, 6.0), 22050).unwrap();
    let report = analyzer.analyze_audio(&buffer);

    assert_eq!(report.genre, "Dark Phonk");
    assert_eq!(report.genre_confidence, 0.9);
    assert_eq!(report.genre_source, Some(GenreSource::Neural));
    assert_eq!(report.genre_probabilities.len(), 3);
}

#[test]
fn test_uncertain_neural_classifier_blends() {
    let analyzer = Analyzer::default()
        .with_classifier(NeuralClassifier::available(FixedClassifier::new([0.2, 0.2, 0.6])));

    let buffer = AudioBuffer::new(generate_kick_pattern(130.0, 22050, 6.0), 22050).unwrap();
    let report = analyzer.analyze_audio(&buffer);

    assert_eq!(report.genre_source, Some(GenreSource::Blended));
    assert_eq!(report.genre_probabilities["Ambient"], 0.6);
    assert_eq!(report.genre_probabilities.len(), SignatureDatabase::builtin().len());
    assert!(report.genre_confidence >= 0.6);
}

#[test]
fn test_custom_signature_table() {
    let json = r#"[
        {"name": "Sub Drone", "bpm_range": [100.0, 140.0], "sub_bass": "very_high", "beat": "variable",
         "mid": "very_low", "high": "very_low", "transient_density": "very_low",
         "dynamic_range": "medium", "vocal_boost": false, "description": "Low drones"},
        {"name": "Bright Pop", "bpm_range": [100.0, 140.0], "sub_bass": "low", "beat": "4/4",
         "mid": "high", "high": "very_high", "transient_density": "high",
         "dynamic_range": "low", "vocal_boost": true, "description": "Bright pop"}
    ]"#;
    let db = Arc::new(SignatureDatabase::from_json(json).unwrap());
    let analyzer = Analyzer::default().with_signatures(db);

    let drone = generate_chord(&[55.0, 82.5], 0.3, 22050, 5.0);
    let report = analyzer.analyze_audio(&AudioBuffer::new(drone, 22050).unwrap());

    assert_eq!(report.genre_probabilities.len(), 2);
    assert_eq!(report.genre, "Sub Drone");
}

#[test]
fn test_matcher_anchor_and_coverage() {
    let db = SignatureDatabase::builtin();
    let config = AnalysisConfig::default();
    for sig in db.iter() {
        let matches = match_genres(&MatchInput::expected_for(sig), db, &config.matcher);
        assert_eq!(matches.len(), db.len());
        let own = matches.iter().find(|m| m.genre == sig.name).unwrap();
        assert_eq!(own.confidence, 1.0, "{} should match its own anchors exactly", sig.name);
    }
}

#[test]
fn test_analyzer_is_shareable_across_threads() {
    let analyzer = Analyzer::default();
    let buffers: Vec<AudioBuffer> = [90.0f32, 120.0, 140.0]
        .iter()
        .map(|&bpm| AudioBuffer::new(generate_kick_pattern(bpm, 22050, 4.0), 22050).unwrap())
        .collect();

    let reports: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = buffers
            .iter()
            .map(|b| scope.spawn(|| analyzer.analyze_audio(b)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.error.is_none()));
}

#[cfg(unix)]
#[test]
fn test_transcription_runs_for_files() {
    use acoustic_profile::Transcription;

    let dir = tempfile::tempdir().unwrap();
    let path = temp_wav(&dir, "tone.wav", &generate_chord(&[440.0], 0.3, 22050, 2.0), 22050);

    let analyzer = Analyzer::default()
        .with_transcription(Transcription::command("echo", vec!["hello world".to_string()]));
    let report = analyzer.analyze_file(&path);

    assert!(report.error.is_none());
    assert!(report.lyrics.starts_with("hello world"), "lyrics: {:?}", report.lyrics);
}

#[test]
fn test_report_json_shape() {
    let buffer = AudioBuffer::new(generate_chord(&[440.0], 0.3, 22050, 2.0), 22050).unwrap();
    let json = serde_json::to_value(analyze_audio(&buffer)).unwrap();

    for field in [
        "bpm",
        "key",
        "energy",
        "loudness",
        "spectral_centroid",
        "spectral_magnitude",
        "genre",
        "genre_confidence",
        "genre_probabilities",
        "lyrics",
        "mastering",
    ] {
        assert!(json.get(field).is_some(), "missing field {}", field);
    }

    let mastering = &json["mastering"];
    assert!(mastering["peak"]["clipping_detected"].is_boolean());
    assert!(mastering["frequency_balance"]["spectrum_data"].is_array());
    assert!(mastering["frequency_balance"]["pink_noise_data"].is_array());
    assert!(mastering["transients"]["over_compressed"].is_boolean());

    let advice = mastering["recommendations"].as_array().unwrap();
    assert!(!advice.is_empty());
    for a in advice {
        let kind = a["type"].as_str().unwrap();
        assert!(["warning", "error", "success"].contains(&kind));
        assert!(a.get("action").is_some());
    }
}
