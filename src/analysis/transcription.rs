//! Lyrics transcription capability
//!
//! Speech-to-text runs in an external program. It is the only stage with
//! unbounded latency, so it always runs under a timeout and any failure
//! degrades to empty text.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::AnalysisError;

/// Default transcription timeout (5 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Placeholder in command arguments replaced by the audio path
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Interval between exit checks while waiting on the child
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long a killed child's stdout reader may take to drain
const READER_GRACE: Duration = Duration::from_secs(1);

/// Something that turns an audio file into text
pub trait Transcriber: Send + Sync {
    /// Transcribe the file at `path`
    ///
    /// # Errors
    ///
    /// Any failure, including a timeout, is an error; callers decide how to degrade.
    fn transcribe(&self, path: &Path) -> Result<String, AnalysisError>;
}

/// Transcription capability, resolved once at startup
#[derive(Debug, Clone, Default)]
pub enum Transcription {
    /// Run an external program and read the transcript from its stdout
    ///
    /// Arguments equal to `{input}` are replaced by the audio path; if none
    /// is present the path is appended.
    Command {
        program: String,
        args: Vec<String>,
        timeout: Duration,
    },
    /// No transcriber; lyrics are always empty
    #[default]
    Unavailable,
}

impl Transcription {
    /// External command with the default timeout
    pub fn command(program: impl Into<String>, args: Vec<String>) -> Self {
        Transcription::Command {
            program: program.into(),
            args,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// True unless this is `Unavailable`
    pub fn is_available(&self) -> bool {
        !matches!(self, Transcription::Unavailable)
    }

    /// Transcript of `path`, or an empty string on any failure
    pub fn lyrics(&self, path: &Path) -> String {
        if !self.is_available() {
            return String::new();
        }
        match self.transcribe(path) {
            Ok(text) => {
                log::debug!("Transcribed {} characters", text.chars().count());
                text
            }
            Err(e) => {
                log::warn!("Transcription failed, continuing without lyrics: {}", e);
                String::new()
            }
        }
    }
}

impl Transcriber for Transcription {
    fn transcribe(&self, path: &Path) -> Result<String, AnalysisError> {
        match self {
            Transcription::Unavailable => Err(AnalysisError::Unavailable(
                "No transcriber configured".to_string(),
            )),
            Transcription::Command {
                program,
                args,
                timeout,
            } => run_with_timeout(program, args, path, *timeout),
        }
    }
}

fn run_with_timeout(
    program: &str,
    args: &[String],
    path: &Path,
    timeout: Duration,
) -> Result<String, AnalysisError> {
    let input = path.to_string_lossy().into_owned();
    let mut resolved: Vec<String> = args
        .iter()
        .map(|a| if a == INPUT_PLACEHOLDER { input.clone() } else { a.clone() })
        .collect();
    if !args.iter().any(|a| a == INPUT_PLACEHOLDER) {
        resolved.push(input);
    }

    log::debug!(
        "Running transcriber: {} {:?} (timeout {:?})",
        program,
        resolved,
        timeout
    );

    let mut child = Command::new(program)
        .args(&resolved)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| AnalysisError::Unavailable(format!("Failed to start {}: {}", program, e)))?;

    // Drain stdout on a separate thread so a chatty child cannot block on a full pipe
    let stdout = child.stdout.take();
    let reader = thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        if let Some(mut out) = stdout {
            out.read_to_end(&mut bytes)?;
        }
        Ok(bytes)
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                join_reader(reader);
                return Err(AnalysisError::ProcessingError(format!(
                    "{} timed out after {:?}",
                    program, timeout
                )));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                join_reader(reader);
                return Err(AnalysisError::ProcessingError(format!(
                    "Failed waiting on {}: {}",
                    program, e
                )));
            }
        }
    };

    let output = reader
        .join()
        .map_err(|_| AnalysisError::ProcessingError("Transcript reader panicked".to_string()))?;

    if !status.success() {
        return Err(AnalysisError::ProcessingError(format!(
            "{} exited with {:?}",
            program,
            status.code()
        )));
    }

    let bytes = output.map_err(|e| {
        AnalysisError::ProcessingError(format!("Failed reading {} output: {}", program, e))
    })?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("{} wrote non-UTF-8 output, replacing invalid bytes", program);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    Ok(text.trim().to_string())
}

/// Join the stdout reader of a killed child
///
/// The pipe closes when the child dies, unless a grandchild inherited it; in
/// that case the reader is left to finish on its own after `READER_GRACE`.
fn join_reader(reader: thread::JoinHandle<std::io::Result<Vec<u8>>>) {
    let started = Instant::now();
    while !reader.is_finished() {
        if started.elapsed() >= READER_GRACE {
            log::warn!("Transcriber output still open after kill, detaching reader");
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
    let _ = reader.join();
}
