//! Production feature extractor.
//!
//! Computes the full acoustic feature bundle for one analysis window:
//! mel spectrogram, chroma, MFCC, spectral contrast, tempo/beats, ZCR,
//! and RMS. All paths are deterministic pure functions of the window.

use std::sync::Mutex;

use rustfft::FftPlanner;

use crate::audio::AudioTrack;
use crate::error::{SyncError, SyncResult};

use super::dsp::{
    apply_filterbank, dct_ii, hann_window, mel_filterbank, power_to_db_ref_max, stft_power,
};
use super::{FeatureExtractor, FeatureSet};

/// FFT-based feature extractor.
///
/// Default parameters: 2048-point FFT, hop 512, 128 mel bands up to
/// 8 kHz, 13 MFCCs.
pub struct SpectralExtractor {
    /// FFT size for the STFT.
    n_fft: usize,
    /// Hop length between frames.
    hop_length: usize,
    /// Number of mel bands.
    n_mels: usize,
    /// Number of MFCC coefficients.
    n_mfcc: usize,
    /// Upper frequency bound of the mel filterbank.
    mel_fmax_hz: f64,
    /// Cached FFT planner.
    planner: Mutex<FftPlanner<f64>>,
}

impl SpectralExtractor {
    /// Create an extractor with default parameters.
    pub fn new() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            n_mfcc: 13,
            mel_fmax_hz: 8000.0,
            planner: Mutex::new(FftPlanner::new()),
        }
    }
}

impl Default for SpectralExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for SpectralExtractor {
    fn extract(
        &self,
        track: &AudioTrack,
        offset_secs: f64,
        duration_secs: f64,
    ) -> SyncResult<FeatureSet> {
        let samples = track.window(offset_secs, duration_secs);
        if samples.is_empty() {
            return Err(SyncError::EmptyWindow { offset_secs });
        }
        let sample_rate = track.sample_rate();

        let fft = {
            let mut planner = self.planner.lock().unwrap();
            planner.plan_fft_forward(self.n_fft)
        };
        let window = hann_window(self.n_fft);
        let power = stft_power(samples, &window, self.hop_length, fft.as_ref());

        let filters = mel_filterbank(self.n_mels, self.n_fft, sample_rate, self.mel_fmax_hz);
        let mut mel_db = apply_filterbank(&power, &filters);
        power_to_db_ref_max(&mut mel_db);

        let mfcc = mfcc_from_mel_db(&mel_db, self.n_mfcc);
        let chroma = chroma_from_power(&power, sample_rate, self.n_fft);
        let contrast = spectral_contrast(&power, sample_rate, self.n_fft);

        let onsets = onset_strength(&mel_db);
        let (tempo_bpm, beat_times) = estimate_tempo_beats(&onsets, sample_rate, self.hop_length);

        let zcr = frame_zcr(samples, self.n_fft, self.hop_length);
        let rms = frame_rms(samples, self.n_fft, self.hop_length);

        Ok(FeatureSet {
            samples: samples.to_vec(),
            sample_rate,
            mel_db,
            chroma,
            mfcc,
            contrast,
            tempo_bpm,
            beat_times,
            zcr,
            rms,
        })
    }
}

/// DCT-II of each log-mel frame, truncated to `n_mfcc` coefficients.
fn mfcc_from_mel_db(mel_db: &[Vec<f64>], n_mfcc: usize) -> Vec<Vec<f64>> {
    let num_frames = mel_db.first().map_or(0, |row| row.len());
    let mut mfcc = vec![vec![0.0; num_frames]; n_mfcc];
    let mut column = vec![0.0; mel_db.len()];

    for t in 0..num_frames {
        for (b, row) in mel_db.iter().enumerate() {
            column[b] = row[t];
        }
        let coeffs = dct_ii(&column, n_mfcc);
        for (k, &c) in coeffs.iter().enumerate() {
            mfcc[k][t] = c;
        }
    }

    mfcc
}

/// Fold FFT-bin energy onto 12 pitch classes (A440 tuning, C = class 0),
/// normalizing each frame by its own peak.
fn chroma_from_power(power_frames: &[Vec<f64>], sample_rate: u32, n_fft: usize) -> Vec<Vec<f64>> {
    let num_frames = power_frames.len();
    let mut chroma = vec![vec![0.0; num_frames]; 12];

    for (t, frame) in power_frames.iter().enumerate() {
        for (bin, &p) in frame.iter().enumerate().skip(1) {
            let freq = bin as f64 * sample_rate as f64 / n_fft as f64;
            let midi = 69.0 + 12.0 * (freq / 440.0).log2();
            let class = (midi.round().rem_euclid(12.0)) as usize % 12;
            chroma[class][t] += p;
        }

        let peak = (0..12).map(|c| chroma[c][t]).fold(0.0f64, f64::max);
        if peak > 0.0 {
            for row in chroma.iter_mut() {
                row[t] /= peak;
            }
        }
    }

    chroma
}

/// Peak-to-valley dB contrast per octave sub-band.
fn spectral_contrast(power_frames: &[Vec<f64>], sample_rate: u32, n_fft: usize) -> Vec<Vec<f64>> {
    const AMIN: f64 = 1e-10;
    const QUANTILE: f64 = 0.02;

    let nyquist = sample_rate as f64 / 2.0;
    let mut edges = vec![0.0];
    let mut edge = 200.0;
    while edge < nyquist {
        edges.push(edge);
        edge *= 2.0;
    }
    edges.push(nyquist);

    let num_bands = edges.len() - 1;
    let num_frames = power_frames.len();
    let mut contrast = vec![vec![0.0; num_frames]; num_bands];

    for (t, frame) in power_frames.iter().enumerate() {
        for band in 0..num_bands {
            let lo_bin = (edges[band] * n_fft as f64 / sample_rate as f64).floor() as usize;
            let hi_bin =
                ((edges[band + 1] * n_fft as f64 / sample_rate as f64).ceil() as usize).min(frame.len());
            if lo_bin >= hi_bin {
                continue;
            }

            let mut bins = frame[lo_bin..hi_bin].to_vec();
            bins.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            let q = ((bins.len() as f64 * QUANTILE).round() as usize)
                .max(1)
                .min(bins.len());
            let valley: f64 = bins[..q].iter().sum::<f64>() / q as f64;
            let peak: f64 = bins[bins.len() - q..].iter().sum::<f64>() / q as f64;
            contrast[band][t] = 10.0 * ((peak + AMIN) / (valley + AMIN)).log10();
        }
    }

    contrast
}

/// Onset strength: positive mel-dB flux averaged over bands.
fn onset_strength(mel_db: &[Vec<f64>]) -> Vec<f64> {
    let num_frames = mel_db.first().map_or(0, |row| row.len());
    if num_frames == 0 || mel_db.is_empty() {
        return vec![];
    }

    let mut envelope = vec![0.0; num_frames];
    for t in 1..num_frames {
        let mut sum = 0.0;
        for row in mel_db {
            sum += (row[t] - row[t - 1]).max(0.0);
        }
        envelope[t] = sum / mel_db.len() as f64;
    }
    envelope
}

/// Tempo from the onset autocorrelation peak in the 30-300 BPM window,
/// beats from onset maxima above the envelope mean.
fn estimate_tempo_beats(envelope: &[f64], sample_rate: u32, hop_length: usize) -> (f64, Vec<f64>) {
    if envelope.len() < 4 {
        return (0.0, vec![]);
    }

    let frames_per_sec = sample_rate as f64 / hop_length as f64;
    let min_lag = ((frames_per_sec * 60.0 / 300.0).round() as usize).max(1);
    let max_lag = ((frames_per_sec * 60.0 / 30.0).round() as usize).min(envelope.len() - 1);

    let mut tempo_bpm = 0.0;
    if min_lag <= max_lag {
        let mut best_lag = 0;
        let mut best = 0.0;
        for lag in min_lag..=max_lag {
            let r: f64 = envelope[lag..]
                .iter()
                .zip(envelope.iter())
                .map(|(a, b)| a * b)
                .sum();
            if r > best {
                best = r;
                best_lag = lag;
            }
        }
        if best_lag > 0 {
            tempo_bpm = 60.0 * frames_per_sec / best_lag as f64;
        }
    }

    let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;
    let mut beat_times = Vec::new();
    for t in 1..envelope.len() - 1 {
        if envelope[t] > mean && envelope[t] >= envelope[t - 1] && envelope[t] > envelope[t + 1] {
            beat_times.push(t as f64 * hop_length as f64 / sample_rate as f64);
        }
    }

    (tempo_bpm, beat_times)
}

/// Zero-crossing rate per frame.
fn frame_zcr(samples: &[f64], frame_length: usize, hop_length: usize) -> Vec<f64> {
    if samples.len() < frame_length {
        return vec![];
    }
    (0..=samples.len() - frame_length)
        .step_by(hop_length)
        .map(|start| {
            let frame = &samples[start..start + frame_length];
            let crossings = frame
                .windows(2)
                .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
                .count();
            crossings as f64 / frame_length as f64
        })
        .collect()
}

/// RMS energy per frame.
fn frame_rms(samples: &[f64], frame_length: usize, hop_length: usize) -> Vec<f64> {
    if samples.len() < frame_length {
        return vec![];
    }
    (0..=samples.len() - frame_length)
        .step_by(hop_length)
        .map(|start| {
            let frame = &samples[start..start + frame_length];
            (frame.iter().map(|&s| s * s).sum::<f64>() / frame_length as f64).sqrt()
        })
        .collect()
}
