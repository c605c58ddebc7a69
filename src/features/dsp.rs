//! DSP primitives shared by the spectral extractor.
//!
//! STFT, mel filterbank, dB conversion, and the DCT used for MFCCs.

use std::f64::consts::PI;

use rustfft::{num_complex::Complex, Fft};

/// Create a periodic Hann window.
pub fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / size as f64).cos()))
        .collect()
}

/// Compute an STFT power spectrogram.
///
/// Returns one row per frame with `n_fft / 2 + 1` power bins. Signals
/// shorter than one frame produce no rows.
pub fn stft_power(
    samples: &[f64],
    window: &[f64],
    hop_length: usize,
    fft: &dyn Fft<f64>,
) -> Vec<Vec<f64>> {
    let n_fft = window.len();
    if samples.len() < n_fft {
        return vec![];
    }

    let num_bins = n_fft / 2 + 1;
    let mut frames = Vec::with_capacity((samples.len() - n_fft) / hop_length + 1);

    for start in (0..=samples.len() - n_fft).step_by(hop_length) {
        let mut buffer: Vec<Complex<f64>> = samples[start..start + n_fft]
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();

        fft.process(&mut buffer);

        frames.push(buffer[..num_bins].iter().map(|c| c.norm_sqr()).collect());
    }

    frames
}

/// One triangular mel filter, stored as its non-zero bin span.
#[derive(Debug, Clone)]
pub struct MelFilter {
    /// Index of the first FFT bin the filter touches.
    pub first_bin: usize,
    /// Filter weights for consecutive bins starting at `first_bin`.
    pub weights: Vec<f64>,
}

/// Convert frequency in Hz to mel scale.
fn hz_to_mel(hz: f64) -> f64 {
    1127.0 * (1.0 + hz / 700.0).ln()
}

/// Convert mel scale to frequency in Hz.
fn mel_to_hz(mel: f64) -> f64 {
    700.0 * ((mel / 1127.0).exp() - 1.0)
}

/// Build a triangular mel filterbank with Slaney normalization.
///
/// `fmax_hz` is clamped to the Nyquist frequency; filters that collapse
/// above it carry no weights.
pub fn mel_filterbank(n_mels: usize, n_fft: usize, sample_rate: u32, fmax_hz: f64) -> Vec<MelFilter> {
    let n_bins = n_fft / 2 + 1;
    let fmax = fmax_hz.min(sample_rate as f64 / 2.0);

    let mel_min = hz_to_mel(0.0);
    let mel_max = hz_to_mel(fmax);

    // n_mels + 2 points for n_mels triangular filters
    let mel_points: Vec<f64> = (0..=n_mels + 1)
        .map(|i| mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64)
        .collect();
    let hz_points: Vec<f64> = mel_points.iter().map(|&m| mel_to_hz(m)).collect();
    let bin_points: Vec<f64> = hz_points
        .iter()
        .map(|&hz| hz * n_fft as f64 / sample_rate as f64)
        .collect();

    let mut filterbank = Vec::with_capacity(n_mels);

    for i in 0..n_mels {
        let start = bin_points[i];
        let center = bin_points[i + 1];
        let end = bin_points[i + 2];

        // Slaney normalization
        let bandwidth = hz_points[i + 2] - hz_points[i];
        let norm = if bandwidth > 0.0 { 2.0 / bandwidth } else { 0.0 };

        let first_bin = (start.ceil() as usize).min(n_bins);
        let last_bin = (end.floor() as usize).min(n_bins.saturating_sub(1));

        let mut weights = Vec::new();
        for j in first_bin..=last_bin.max(first_bin) {
            if j >= n_bins {
                break;
            }
            let freq_bin = j as f64;
            let weight = if freq_bin < center && center > start {
                (freq_bin - start) / (center - start)
            } else if freq_bin >= center && end > center {
                (end - freq_bin) / (end - center)
            } else {
                0.0
            };
            weights.push(weight.max(0.0) * norm);
        }

        filterbank.push(MelFilter { first_bin, weights });
    }

    filterbank
}

/// Apply a mel filterbank to a frame-major power spectrogram.
///
/// Returns a band-major matrix: one row per filter, one column per frame.
pub fn apply_filterbank(power_frames: &[Vec<f64>], filters: &[MelFilter]) -> Vec<Vec<f64>> {
    let num_frames = power_frames.len();
    let mut bands = vec![vec![0.0; num_frames]; filters.len()];

    for (frame_idx, frame) in power_frames.iter().enumerate() {
        for (band_idx, filter) in filters.iter().enumerate() {
            let mut sum = 0.0;
            for (w, &p) in filter
                .weights
                .iter()
                .zip(frame[filter.first_bin.min(frame.len())..].iter())
            {
                sum += w * p;
            }
            bands[band_idx][frame_idx] = sum;
        }
    }

    bands
}

/// Convert a power matrix to dB in place, referenced to the matrix peak
/// and floored 80 dB below it.
pub fn power_to_db_ref_max(bands: &mut [Vec<f64>]) {
    const AMIN: f64 = 1e-10;
    const TOP_DB: f64 = 80.0;

    let peak = bands
        .iter()
        .flat_map(|row| row.iter())
        .fold(AMIN, |acc, &p| acc.max(p));
    let ref_db = 10.0 * peak.log10();

    for row in bands.iter_mut() {
        for value in row.iter_mut() {
            let db = 10.0 * value.max(AMIN).log10() - ref_db;
            *value = db.max(-TOP_DB);
        }
    }
}

/// Orthonormal DCT-II of `input`, truncated to the first `n_out` terms.
pub fn dct_ii(input: &[f64], n_out: usize) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; n_out];
    }

    let scale0 = (1.0 / n as f64).sqrt();
    let scale = (2.0 / n as f64).sqrt();

    (0..n_out)
        .map(|k| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| x * (PI * (i as f64 + 0.5) * k as f64 / n as f64).cos())
                .sum();
            sum * if k == 0 { scale0 } else { scale }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::FftPlanner;

    #[test]
    fn hann_window_is_bounded_with_unit_peak() {
        let w = hann_window(1024);
        assert_eq!(w.len(), 1024);
        assert!(w[0].abs() < 1e-12);
        assert!((w[512] - 1.0).abs() < 1e-12);
        assert!(w.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn stft_power_frame_count() {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(256);
        let window = hann_window(256);
        let samples = vec![0.5; 1024];

        let frames = stft_power(&samples, &window, 128, fft.as_ref());

        // (1024 - 256) / 128 + 1 = 7 frames
        assert_eq!(frames.len(), 7);
        assert_eq!(frames[0].len(), 129);
    }

    #[test]
    fn stft_power_empty_for_short_signal() {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(256);
        let window = hann_window(256);

        assert!(stft_power(&[0.0; 100], &window, 128, fft.as_ref()).is_empty());
    }

    #[test]
    fn stft_localizes_tone_energy() {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(512);
        let window = hann_window(512);

        // Tone exactly on bin 32: f = 32 * sr / 512
        let sr = 8192.0;
        let freq = 32.0 * sr / 512.0;
        let samples: Vec<f64> = (0..2048)
            .map(|i| (2.0 * PI * freq * i as f64 / sr).sin())
            .collect();

        let frames = stft_power(&samples, &window, 256, fft.as_ref());
        let frame = &frames[0];
        let peak_bin = frame
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();

        assert_eq!(peak_bin, 32);
    }

    #[test]
    fn filterbank_covers_expected_bands() {
        let filters = mel_filterbank(128, 2048, 22050, 8000.0);
        assert_eq!(filters.len(), 128);
        // Every filter stays below the 8 kHz cutoff bin
        let cutoff_bin = (8000.0 * 2048.0 / 22050.0_f64).ceil() as usize;
        for f in &filters {
            assert!(f.first_bin + f.weights.len() <= cutoff_bin + 2);
        }
    }

    #[test]
    fn filterbank_clamps_fmax_to_nyquist() {
        // 8 kHz cutoff on an 8 kHz sample rate clamps to 4 kHz
        let filters = mel_filterbank(64, 2048, 8000, 8000.0);
        let n_bins = 2048 / 2 + 1;
        for f in &filters {
            assert!(f.first_bin + f.weights.len() <= n_bins);
        }
    }

    #[test]
    fn power_to_db_references_peak() {
        let mut bands = vec![vec![1.0, 0.1, 0.001]];
        power_to_db_ref_max(&mut bands);
        assert!((bands[0][0] - 0.0).abs() < 1e-9);
        assert!((bands[0][1] - (-10.0)).abs() < 1e-9);
        assert!((bands[0][2] - (-30.0)).abs() < 1e-9);
    }

    #[test]
    fn power_to_db_floors_at_80_below_peak() {
        let mut bands = vec![vec![1.0, 1e-20]];
        power_to_db_ref_max(&mut bands);
        assert!((bands[0][1] - (-80.0)).abs() < 1e-9);
    }

    #[test]
    fn dct_of_constant_concentrates_in_first_term() {
        let out = dct_ii(&[1.0; 16], 4);
        assert!(out[0] > 3.9);
        for &c in &out[1..] {
            assert!(c.abs() < 1e-9);
        }
    }
}
