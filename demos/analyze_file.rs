//! Example: Analyze a single audio file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- <audio_file> [--json]
//!
//! With the `ml` feature, set `ACOUSTIC_PROFILE_MODEL` to an ONNX model path to
//! enable the neural genre classifier.

use acoustic_profile::Analyzer;
use std::env;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let Some(path) = args.iter().find(|a| !a.starts_with("--")) else {
        eprintln!("Usage: analyze_file <audio_file> [--json]");
        std::process::exit(2);
    };

    #[allow(unused_mut)]
    let mut analyzer = Analyzer::default();

    #[cfg(feature = "ml")]
    if let Ok(model) = env::var("ACOUSTIC_PROFILE_MODEL") {
        analyzer = analyzer.with_classifier(acoustic_profile::genre::onnx::load_neural_classifier(
            Path::new(&model),
        ));
    }

    let report = analyzer.analyze_file(Path::new(path));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(err) = &report.error {
        eprintln!("Analysis failed: {}", err);
        std::process::exit(1);
    }

    let m = &report.mastering;
    println!("Analysis Results:");
    println!("  BPM: {:.1}", report.bpm);
    println!("  Key: {}", report.key);
    println!("  Energy: {:.1}  Loudness: {:.1}", report.energy, report.loudness);
    println!("  Spectral centroid: {:.1} Hz", report.spectral_centroid);
    println!(
        "  Genre: {} ({:.2}, {:?})",
        report.genre, report.genre_confidence, report.genre_source
    );
    println!("Mastering:");
    println!("  Loudness: {:.1} LUFS", m.lufs);
    println!(
        "  True peak: {:.2} dBFS{}",
        m.peak.dbfs,
        if m.peak.clipping { " (clipping)" } else { "" }
    );
    println!(
        "  Balance: low {:+.1} dB, mid {:+.1} dB, high {:+.1} dB",
        m.frequency_balance.low_db_diff,
        m.frequency_balance.mid_db_diff,
        m.frequency_balance.high_db_diff
    );
    println!(
        "  Crest factor: {:.1} dB, {} transients",
        m.transients.crest_factor_db, m.transients.num_transients
    );
    for advice in &m.recommendations {
        match &advice.action {
            Some(action) => println!("  [{:?}] {} -> {}", advice.kind, advice.message, action),
            None => println!("  [{:?}] {}", advice.kind, advice.message),
        }
    }

    Ok(())
}
