//! Example: Analyze multiple audio files in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- [--jobs N] [--json] <file1> <file2> ...
//!
//! Notes:
//! - Parallelism is across files. One `Analyzer` is shared by all workers.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.

use acoustic_profile::{AcousticReport, Analyzer};
use rayon::prelude::*;
use std::env;
use std::path::Path;
use std::time::Instant;

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn percentile(mut xs: Vec<f32>, p: f32) -> Option<f32> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_by(|a, b| a.total_cmp(b));
    let idx = ((xs.len() - 1) as f32 * p.clamp(0.0, 1.0)).round() as usize;
    Some(xs[idx.min(xs.len() - 1)])
}

struct ItemOut {
    path: String,
    report: AcousticReport,
    processing_ms: f32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut paths: Vec<String> = Vec::new();

    while !args.is_empty() {
        let a = args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_batch [--jobs N] [--json] <file1> <file2> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one report per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let analyzer = Analyzer::default();

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<ItemOut> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let started = Instant::now();
                let report = analyzer.analyze_file(Path::new(path));
                ItemOut {
                    path: path.clone(),
                    report,
                    processing_ms: started.elapsed().as_secs_f32() * 1000.0,
                }
            })
            .collect()
    });

    for (idx, o) in outs.iter().enumerate() {
        if json {
            let mut value = serde_json::to_value(&o.report)?;
            value["file"] = serde_json::Value::String(o.path.clone());
            println!("{}", value);
            continue;
        }
        match &o.report.error {
            None => println!(
                "[{}/{}] {}: BPM={:.1} Key={} Genre={} ({:.2}) LUFS={:.1} time={:.0}ms",
                idx + 1,
                outs.len(),
                o.path,
                o.report.bpm,
                o.report.key,
                o.report.genre,
                o.report.genre_confidence,
                o.report.mastering.lufs,
                o.processing_ms
            ),
            Some(err) => println!("[{}/{}] {}: ERROR: {}", idx + 1, outs.len(), o.path, err),
        }
    }

    let ok_times: Vec<f32> = outs
        .iter()
        .filter(|o| o.report.error.is_none())
        .map(|o| o.processing_ms)
        .collect();
    let wall_ms = t0.elapsed().as_secs_f64() * 1000.0;

    eprintln!("Done: ok={}/{} wall={:.0}ms", ok_times.len(), outs.len(), wall_ms);
    if !ok_times.is_empty() {
        let mean = ok_times.iter().sum::<f32>() / ok_times.len() as f32;
        let p50 = percentile(ok_times.clone(), 0.50).unwrap_or(mean);
        let p90 = percentile(ok_times.clone(), 0.90).unwrap_or(mean);
        eprintln!("processing_time_ms: mean={:.2} p50={:.2} p90={:.2}", mean, p50, p90);
    }

    Ok(())
}
