//! Checkpoint verification.
//!
//! Independently of the search phases, the chosen lag is re-scored at
//! fixed relative positions along the timeline. Checkpoints that cannot
//! be evaluated are recorded (never omitted) with confidence 0.

use serde::{Deserialize, Serialize};

use crate::audio::AudioTrack;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::features::FeatureExtractor;
use crate::report::Quality;
use crate::scoring::ScoreBreakdown;

/// Outcome label for one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    /// The lag-shifted comparison window fell outside the track.
    OutOfRange,
    /// Extraction failed at this point.
    Error,
}

impl From<Quality> for CheckpointQuality {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Excellent => CheckpointQuality::Excellent,
            Quality::Good => CheckpointQuality::Good,
            Quality::Fair => CheckpointQuality::Fair,
            Quality::Poor => CheckpointQuality::Poor,
        }
    }
}

/// One independent validation sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Relative position on the timeline (0-1).
    pub position: f64,
    /// Absolute anchor time in seconds.
    #[serde(rename = "time")]
    pub time_secs: f64,
    /// Combined similarity at this point (0 when not evaluable).
    pub confidence: f64,
    /// Graded label, or the reason the point was not evaluable.
    pub quality: CheckpointQuality,
}

/// Re-validate `lag_secs` at each configured relative position.
///
/// Every configured position yields a checkpoint: out-of-range windows
/// and extraction failures are recorded with confidence 0 rather than
/// dropped.
pub fn verify_checkpoints(
    reference: &AudioTrack,
    comparison: &AudioTrack,
    extractor: &dyn FeatureExtractor,
    lag_secs: f64,
    timeline_secs: f64,
    config: &SyncConfig,
) -> Vec<Checkpoint> {
    config
        .checkpoint_positions
        .iter()
        .map(|&position| {
            let time_secs = timeline_secs * position;
            let target_secs = time_secs + lag_secs;

            if !comparison.window_fits(target_secs, config.sample_duration_secs) {
                tracing::warn!(
                    "checkpoint at {:.2}s: shifted window {:.2}s is out of range",
                    time_secs,
                    target_secs
                );
                return Checkpoint {
                    position,
                    time_secs,
                    confidence: 0.0,
                    quality: CheckpointQuality::OutOfRange,
                };
            }

            match checkpoint_score(reference, comparison, extractor, time_secs, target_secs, config)
            {
                Ok(confidence) => {
                    tracing::info!(
                        "checkpoint at {:.2}s: confidence {:.4}",
                        time_secs,
                        confidence
                    );
                    Checkpoint {
                        position,
                        time_secs,
                        confidence,
                        quality: Quality::grade(confidence).into(),
                    }
                }
                Err(err) => {
                    tracing::warn!("checkpoint at {:.2}s failed: {}", time_secs, err);
                    Checkpoint {
                        position,
                        time_secs,
                        confidence: 0.0,
                        quality: CheckpointQuality::Error,
                    }
                }
            }
        })
        .collect()
}

/// Score one checkpoint pair.
fn checkpoint_score(
    reference: &AudioTrack,
    comparison: &AudioTrack,
    extractor: &dyn FeatureExtractor,
    time_secs: f64,
    target_secs: f64,
    config: &SyncConfig,
) -> SyncResult<f64> {
    let anchor = extractor.extract(reference, time_secs, config.sample_duration_secs)?;
    let probe = extractor.extract(comparison, target_secs, config.sample_duration_secs)?;
    Ok(ScoreBreakdown::measure(&anchor, &probe)?.combined(&config.weights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SpectralExtractor;
    use std::f64::consts::PI;

    fn tone_track(duration_secs: f64, sample_rate: u32) -> AudioTrack {
        let n = (duration_secs * sample_rate as f64) as usize;
        let samples: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (2.0 * PI * (100.0 * t + 10.0 * t * t)).sin()
            })
            .collect();
        AudioTrack::from_samples(samples, sample_rate)
    }

    fn small_config() -> SyncConfig {
        SyncConfig {
            sample_rate: 4000,
            sample_duration_secs: 2.0,
            ..SyncConfig::default()
        }
    }

    #[test]
    fn zero_lag_checkpoints_score_high_on_identical_tracks() {
        let track = tone_track(20.0, 4000);
        let extractor = SpectralExtractor::new();
        let config = small_config();

        let checkpoints =
            verify_checkpoints(&track, &track, &extractor, 0.0, 20.0, &config);

        assert_eq!(checkpoints.len(), 3);
        for checkpoint in &checkpoints {
            assert!(checkpoint.confidence > 0.9);
            assert_eq!(checkpoint.quality, CheckpointQuality::Excellent);
        }
    }

    #[test]
    fn out_of_range_checkpoints_are_recorded_not_dropped() {
        let track = tone_track(20.0, 4000);
        let extractor = SpectralExtractor::new();
        let config = small_config();

        // Lag pushes the 75% checkpoint (15s) to 23s, past the track end
        let checkpoints = verify_checkpoints(&track, &track, &extractor, 8.0, 20.0, &config);

        assert_eq!(checkpoints.len(), 3);
        let last = &checkpoints[2];
        assert_eq!(last.quality, CheckpointQuality::OutOfRange);
        assert_eq!(last.confidence, 0.0);
    }

    #[test]
    fn checkpoint_positions_follow_config() {
        let track = tone_track(20.0, 4000);
        let extractor = SpectralExtractor::new();
        let config = SyncConfig {
            checkpoint_positions: vec![0.1, 0.9],
            ..small_config()
        };

        let checkpoints =
            verify_checkpoints(&track, &track, &extractor, 0.0, 20.0, &config);

        assert_eq!(checkpoints.len(), 2);
        assert!((checkpoints[0].time_secs - 2.0).abs() < 1e-9);
        assert!((checkpoints[1].time_secs - 18.0).abs() < 1e-9);
    }
}
