//! FFmpeg audio decoding.
//!
//! Decodes a source file to mono f64 samples at the analysis sample rate
//! via an ffmpeg subprocess, and queries container duration via ffprobe.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::audio::AudioTrack;
use crate::error::{SyncError, SyncResult};

/// Default sample rate for analysis.
pub const DEFAULT_ANALYSIS_SAMPLE_RATE: u32 = 22050;

/// Decode a source file into an in-memory track.
///
/// The audio is:
/// - Converted to mono (channel downmix)
/// - Resampled to the analysis sample rate
/// - Output as raw f64 samples over a pipe
pub fn load_track(input_path: &Path, sample_rate: u32) -> SyncResult<AudioTrack> {
    if !input_path.exists() {
        return Err(SyncError::SourceNotFound(input_path.display().to_string()));
    }

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i")
        .arg(input_path)
        .arg("-vn") // No video
        .arg("-ac")
        .arg("1") // Mono
        .arg("-ar")
        .arg(sample_rate.to_string())
        .arg("-f")
        .arg("f64le") // 64-bit float, little endian
        .arg("-acodec")
        .arg("pcm_f64le")
        .arg("pipe:1"); // Output to stdout

    cmd.stderr(Stdio::null()).stdout(Stdio::piped());

    tracing::debug!("Running FFmpeg: {:?}", cmd);

    let mut child = cmd
        .spawn()
        .map_err(|e| SyncError::Ffmpeg(format!("Failed to spawn FFmpeg: {}", e)))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| SyncError::Ffmpeg("Failed to capture FFmpeg stdout".to_string()))?;

    let mut buffer = Vec::new();
    stdout.read_to_end(&mut buffer)?;

    let status = child
        .wait()
        .map_err(|e| SyncError::Ffmpeg(format!("FFmpeg process error: {}", e)))?;

    if !status.success() {
        return Err(SyncError::Ffmpeg(format!(
            "FFmpeg exited with code: {:?}",
            status.code()
        )));
    }

    let samples = bytes_to_f64_samples(&buffer);

    if samples.is_empty() {
        return Err(SyncError::Decode(format!(
            "no audio samples decoded from {}",
            input_path.display()
        )));
    }

    tracing::debug!(
        "Decoded {} samples ({:.2}s) from {}",
        samples.len(),
        samples.len() as f64 / sample_rate as f64,
        input_path.display()
    );

    Ok(AudioTrack::from_samples(samples, sample_rate))
}

/// Get the duration of a media file using FFprobe.
pub fn probe_duration(input_path: &Path) -> SyncResult<f64> {
    if !input_path.exists() {
        return Err(SyncError::SourceNotFound(input_path.display().to_string()));
    }

    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(input_path)
        .output()
        .map_err(|e| SyncError::Ffmpeg(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(SyncError::Ffmpeg(
            "ffprobe failed to get duration".to_string(),
        ));
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    duration_str
        .trim()
        .parse::<f64>()
        .map_err(|e| SyncError::Ffmpeg(format!("Failed to parse duration: {}", e)))
}

/// Convert raw bytes to f64 samples (little-endian).
fn bytes_to_f64_samples(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let arr: [u8; 8] = chunk.try_into().unwrap();
            f64::from_le_bytes(arr)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_to_samples_converts_correctly() {
        let val1: f64 = 0.5;
        let val2: f64 = -0.25;

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&val1.to_le_bytes());
        bytes.extend_from_slice(&val2.to_le_bytes());

        let samples = bytes_to_f64_samples(&bytes);

        assert_eq!(samples.len(), 2);
        assert!((samples[0] - 0.5).abs() < 1e-10);
        assert!((samples[1] - (-0.25)).abs() < 1e-10);
    }

    #[test]
    fn bytes_to_samples_handles_partial() {
        // Only 10 bytes: one full sample, remainder ignored
        let bytes = vec![0u8; 10];
        let samples = bytes_to_f64_samples(&bytes);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn load_track_rejects_missing_file() {
        let result = load_track(Path::new("/nonexistent/file.wav"), 22050);
        assert!(matches!(result, Err(SyncError::SourceNotFound(_))));
    }

    #[test]
    fn probe_duration_rejects_missing_file() {
        let result = probe_duration(Path::new("/nonexistent/file.wav"));
        assert!(matches!(result, Err(SyncError::SourceNotFound(_))));
    }
}
