//! Acoustic similarity scoring.
//!
//! Pure functions that compare two feature sets. Every comparison
//! computes the full four-component breakdown (raw waveform
//! cross-correlation plus mel/chroma/MFCC cosine similarity); a requested
//! method then selects or combines, so "combined" is a pure function of
//! the component scores.

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::features::FeatureSet;

/// Similarity method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMethod {
    /// Normalized cross-correlation of raw samples.
    Raw,
    /// Cosine similarity of mel spectrograms.
    Mel,
    /// Cosine similarity of chroma matrices.
    Chroma,
    /// Cosine similarity of MFCC matrices.
    Mfcc,
    /// Fixed weighted sum of all four components.
    #[default]
    Combined,
}

/// Component weights for combined similarity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub raw: f64,
    pub mel: f64,
    pub chroma: f64,
    pub mfcc: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            raw: 0.3,
            mel: 0.3,
            chroma: 0.2,
            mfcc: 0.2,
        }
    }
}

/// All four component scores for one feature-set pair.
///
/// Scores are nominally in [0,1] but not hard-clamped; raw
/// cross-correlation can exceed 1 on pathological input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub raw: f64,
    pub mel: f64,
    pub chroma: f64,
    pub mfcc: f64,
}

impl ScoreBreakdown {
    /// Compare two feature sets.
    ///
    /// The raw term is directional (reference vs comparison); the cosine
    /// terms are symmetric. Unequal feature lengths truncate to the
    /// shorter side; a matrix without a single time frame contributes 0.
    pub fn measure(reference: &FeatureSet, comparison: &FeatureSet) -> SyncResult<Self> {
        if reference.sample_rate != comparison.sample_rate {
            return Err(SyncError::SampleRateMismatch {
                reference: reference.sample_rate,
                comparison: comparison.sample_rate,
            });
        }

        Ok(Self {
            raw: raw_similarity(&reference.samples, &comparison.samples),
            mel: matrix_cosine(&reference.mel_db, &comparison.mel_db),
            chroma: matrix_cosine(&reference.chroma, &comparison.chroma),
            mfcc: matrix_cosine(&reference.mfcc, &comparison.mfcc),
        })
    }

    /// Weighted sum of all four components.
    pub fn combined(&self, weights: &ScoreWeights) -> f64 {
        weights.raw * self.raw
            + weights.mel * self.mel
            + weights.chroma * self.chroma
            + weights.mfcc * self.mfcc
    }

    /// Score for the requested method.
    pub fn select(&self, method: ScoreMethod, weights: &ScoreWeights) -> f64 {
        match method {
            ScoreMethod::Raw => self.raw,
            ScoreMethod::Mel => self.mel,
            ScoreMethod::Chroma => self.chroma,
            ScoreMethod::Mfcc => self.mfcc,
            ScoreMethod::Combined => self.combined(weights),
        }
    }
}

/// Normalized valid-mode cross-correlation of raw samples.
///
/// The shorter signal slides across the longer one over the fully
/// overlapping region; the peak magnitude is normalized by the geometric
/// mean of the signal energies. Returns 0 when either signal is empty or
/// has zero energy.
fn raw_similarity(reference: &[f64], comparison: &[f64]) -> f64 {
    if reference.is_empty() || comparison.is_empty() {
        return 0.0;
    }

    let ref_energy: f64 = reference.iter().map(|x| x * x).sum();
    let cmp_energy: f64 = comparison.iter().map(|x| x * x).sum();
    let norm = (ref_energy * cmp_energy).sqrt();
    if norm <= 0.0 {
        return 0.0;
    }

    let (long, short) = if reference.len() >= comparison.len() {
        (reference, comparison)
    } else {
        (comparison, reference)
    };

    let mut max_corr = 0.0f64;
    for start in 0..=long.len() - short.len() {
        let dot: f64 = long[start..start + short.len()]
            .iter()
            .zip(short.iter())
            .map(|(a, b)| a * b)
            .sum();
        max_corr = max_corr.max(dot.abs());
    }

    max_corr / norm
}

/// Cosine similarity of two band-major matrices flattened row-major and
/// truncated to the shorter length. Returns 0 when either flattened
/// vector is empty or has zero norm.
fn matrix_cosine(a: &[Vec<f64>], b: &[Vec<f64>]) -> f64 {
    let flat_a: Vec<f64> = a.iter().flatten().copied().collect();
    let flat_b: Vec<f64> = b.iter().flatten().copied().collect();

    let len = flat_a.len().min(flat_b.len());
    if len == 0 {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in flat_a[..len].iter().zip(flat_b[..len].iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm = (norm_a * norm_b).sqrt();
    if norm <= 0.0 {
        return 0.0;
    }
    dot / norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioTrack;
    use crate::features::{FeatureExtractor, SpectralExtractor};
    use std::f64::consts::PI;

    fn chirp_track(duration_secs: f64, sample_rate: u32) -> AudioTrack {
        let n = (duration_secs * sample_rate as f64) as usize;
        let samples: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (2.0 * PI * (200.0 * t + 15.0 * t * t)).sin()
            })
            .collect();
        AudioTrack::from_samples(samples, sample_rate)
    }

    #[test]
    fn weights_sum_to_one() {
        let w = ScoreWeights::default();
        assert!((w.raw + w.mel + w.chroma + w.mfcc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn self_similarity_is_near_one() {
        let track = chirp_track(4.0, 8000);
        let extractor = SpectralExtractor::new();
        let features = extractor.extract(&track, 0.0, 3.0).unwrap();

        let breakdown = ScoreBreakdown::measure(&features, &features).unwrap();

        assert!((breakdown.mel - 1.0).abs() < 1e-6);
        assert!((breakdown.chroma - 1.0).abs() < 1e-6);
        assert!((breakdown.mfcc - 1.0).abs() < 1e-6);
        assert!((breakdown.raw - 1.0).abs() < 1e-6);
        assert!(breakdown.combined(&ScoreWeights::default()) >= 0.99);
    }

    #[test]
    fn mismatched_sample_rates_are_rejected() {
        let extractor = SpectralExtractor::new();
        let a = extractor
            .extract(&chirp_track(2.0, 8000), 0.0, 1.0)
            .unwrap();
        let b = extractor
            .extract(&chirp_track(2.0, 16000), 0.0, 1.0)
            .unwrap();

        assert!(matches!(
            ScoreBreakdown::measure(&a, &b),
            Err(SyncError::SampleRateMismatch { .. })
        ));
    }

    #[test]
    fn raw_similarity_zero_for_silence() {
        assert_eq!(raw_similarity(&[0.0; 100], &[0.0; 100]), 0.0);
        assert_eq!(raw_similarity(&[], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn raw_similarity_finds_embedded_copy() {
        // Short pattern embedded inside a longer zero signal
        let pattern: Vec<f64> = (0..64).map(|i| (i as f64 * 0.7).sin()).collect();
        let mut long = vec![0.0; 256];
        long[100..164].copy_from_slice(&pattern);

        let score = raw_similarity(&long, &pattern);
        // Energy normalization uses both full signals, so the peak equals
        // sqrt(E_pattern / E_long) = 1.0 here (all of long's energy is the
        // pattern)
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn matrix_cosine_truncates_to_shorter() {
        let a = vec![vec![1.0, 0.0, 5.0]];
        let b = vec![vec![1.0, 0.0]];
        // Truncated to [1,0] vs [1,0]
        assert!((matrix_cosine(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn matrix_cosine_zero_for_empty_or_silent() {
        let empty: Vec<Vec<f64>> = vec![Vec::new(); 12];
        let full = vec![vec![1.0, 2.0]];
        assert_eq!(matrix_cosine(&empty, &full), 0.0);
        assert_eq!(matrix_cosine(&[vec![0.0, 0.0]], &[vec![0.0, 0.0]]), 0.0);
    }

    #[test]
    fn select_picks_requested_component() {
        let breakdown = ScoreBreakdown {
            raw: 0.1,
            mel: 0.2,
            chroma: 0.3,
            mfcc: 0.4,
        };
        let weights = ScoreWeights::default();

        assert_eq!(breakdown.select(ScoreMethod::Raw, &weights), 0.1);
        assert_eq!(breakdown.select(ScoreMethod::Mel, &weights), 0.2);
        assert_eq!(breakdown.select(ScoreMethod::Chroma, &weights), 0.3);
        assert_eq!(breakdown.select(ScoreMethod::Mfcc, &weights), 0.4);

        let combined = breakdown.select(ScoreMethod::Combined, &weights);
        assert!((combined - (0.3 * 0.1 + 0.3 * 0.2 + 0.2 * 0.3 + 0.2 * 0.4)).abs() < 1e-12);
    }
}
