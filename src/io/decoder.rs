//! Audio decoding using Symphonia
//!
//! Probes the container, decodes the first audio track and averages all
//! channels to mono. The result stays at the file's native sample rate; the
//! feature and mastering paths resample from it independently.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::sample_buffer::AudioBuffer;
use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix_interleaved;

/// Decode an audio file to a mono [`AudioBuffer`]
///
/// # Arguments
///
/// * `path` - Path to audio file (WAV, MP3, FLAC, OGG/Vorbis, AAC)
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` if the file cannot be opened, has no
/// decodable audio track, or yields no samples.
pub fn decode_audio(path: &Path) -> Result<AudioBuffer, AnalysisError> {
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            AnalysisError::DecodingError("No supported audio tracks found".to_string())
        })?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
        AnalysisError::DecodingError("Audio track has no sample rate".to_string())
    })?;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut mono: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => {
                log::debug!("Stopping decode at packet error: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channels = spec.channels.count();
                let mut interleaved = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                interleaved.copy_interleaved_ref(decoded);
                mono.extend(downmix_interleaved(interleaved.samples(), channels)?);
            }
            Err(SymphoniaError::DecodeError(_)) => {
                // Corrupted packets are skipped
                skipped_packets += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if skipped_packets > 0 {
        log::warn!(
            "Skipped {} undecodable packets in {}",
            skipped_packets,
            path.display()
        );
    }

    if mono.is_empty() {
        return Err(AnalysisError::DecodingError(format!(
            "No audio samples decoded from {}",
            path.display()
        )));
    }

    log::debug!(
        "Decoded {} mono samples at {} Hz ({:.2}s)",
        mono.len(),
        sample_rate,
        mono.len() as f32 / sample_rate as f32
    );

    AudioBuffer::new(mono, sample_rate)
}
