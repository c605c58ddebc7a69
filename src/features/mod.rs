//! Acoustic feature extraction.
//!
//! The search engine depends only on the `FeatureExtractor` trait; the
//! production implementation (`SpectralExtractor`) computes the full
//! feature bundle with FFT-based DSP. Extraction is pure and
//! deterministic given (track, offset, duration, rate).

mod dsp;
mod extractor;

pub use extractor::SpectralExtractor;

use crate::audio::AudioTrack;
use crate::error::SyncResult;

/// Immutable feature bundle extracted from one analysis window.
///
/// Matrices are band-major: one row per band/coefficient, one column per
/// STFT frame. A window too short for a single frame yields empty
/// matrices; the scorer treats those as zero-contribution terms.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    /// Raw window samples.
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Mel spectrogram in dB, 128 bands up to 8 kHz.
    pub mel_db: Vec<Vec<f64>>,
    /// Chroma energy, 12 pitch classes.
    pub chroma: Vec<Vec<f64>>,
    /// MFCCs, 13 coefficients.
    pub mfcc: Vec<Vec<f64>>,
    /// Spectral contrast per octave sub-band.
    pub contrast: Vec<Vec<f64>>,
    /// Estimated tempo in BPM (0 when the window has no usable onsets).
    pub tempo_bpm: f64,
    /// Beat positions in seconds, relative to the window start.
    pub beat_times: Vec<f64>,
    /// Zero-crossing rate per frame.
    pub zcr: Vec<f64>,
    /// RMS energy per frame.
    pub rms: Vec<f64>,
}

/// Contract between the search engine and the feature extraction stage.
///
/// `extract` fails with `SyncError::EmptyWindow` when the requested window
/// yields zero samples (offset at or past the track end). A window that
/// merely overruns the end is truncated, matching decoder semantics.
pub trait FeatureExtractor: Send + Sync {
    /// Extract features for the window starting at `offset_secs`.
    fn extract(
        &self,
        track: &AudioTrack,
        offset_secs: f64,
        duration_secs: f64,
    ) -> SyncResult<FeatureSet>;
}
