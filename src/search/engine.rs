//! Search engine orchestration.
//!
//! Composes grids, sweeps, scan-position selection, and checkpoint
//! verification into the two search modes.

use serde::{Deserialize, Serialize};

use crate::audio::AudioTrack;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::features::FeatureExtractor;
use crate::report::SyncReport;

use super::checkpoints::verify_checkpoints;
use super::grid::{centered_grid, symmetric_grid};
use super::positions::{scan_positions, select_scan_position};
use super::sweep::sweep;

/// Search mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// One fine-step sweep anchored at the track start.
    #[default]
    Simple,
    /// Multi-position coarse scan, fine refinement, and checkpoint
    /// verification.
    MultiCheckpoint,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::Simple => write!(f, "simple"),
            SyncMode::MultiCheckpoint => write!(f, "multi_checkpoint"),
        }
    }
}

/// Offset search engine.
///
/// Holds the immutable configuration and the feature extraction seam;
/// all search state lives on the stack of one `synchronize` call.
pub struct SyncEngine<'a> {
    config: &'a SyncConfig,
    extractor: &'a dyn FeatureExtractor,
}

impl<'a> SyncEngine<'a> {
    /// Create an engine.
    pub fn new(config: &'a SyncConfig, extractor: &'a dyn FeatureExtractor) -> Self {
        Self { config, extractor }
    }

    /// Locate the offset between two tracks.
    ///
    /// `timeline_secs` is the event timeline length (typically the video
    /// duration) used to place scan positions and checkpoints.
    pub fn synchronize(
        &self,
        reference: &AudioTrack,
        comparison: &AudioTrack,
        timeline_secs: f64,
        mode: SyncMode,
    ) -> SyncResult<SyncReport> {
        if !(timeline_secs > 0.0) {
            return Err(SyncError::InvalidDuration(format!(
                "timeline must be positive, got {}",
                timeline_secs
            )));
        }

        match mode {
            SyncMode::Simple => self.single_pass(reference, comparison),
            SyncMode::MultiCheckpoint => {
                self.multi_checkpoint(reference, comparison, timeline_secs)
            }
        }
    }

    /// One fine-step sweep over the full offset range, anchored at the
    /// reference track start.
    fn single_pass(
        &self,
        reference: &AudioTrack,
        comparison: &AudioTrack,
    ) -> SyncResult<SyncReport> {
        let config = self.config;
        tracing::info!(
            "single-pass search: ±{}s at {}s steps",
            config.max_offset_secs,
            config.fine_step_secs
        );

        let offsets = symmetric_grid(config.max_offset_secs, config.fine_step_secs);
        let outcome = sweep(
            reference,
            comparison,
            self.extractor,
            0.0,
            config.sample_duration_secs,
            &offsets,
            &config.weights,
        )?;

        tracing::info!(
            "best lag {:+.3}s, score {:.4}",
            outcome.best.offset_secs,
            outcome.best.score
        );

        Ok(SyncReport::from_single_pass(outcome.best))
    }

    /// Coarse multi-position scan, fine refinement, checkpoint
    /// verification.
    fn multi_checkpoint(
        &self,
        reference: &AudioTrack,
        comparison: &AudioTrack,
        timeline_secs: f64,
    ) -> SyncResult<SyncReport> {
        let config = self.config;
        let scan_window = config.scan_window_secs(timeline_secs);
        let anchors = scan_positions(timeline_secs, scan_window, config.long_timeline_secs);

        tracing::info!(
            "phase 1: coarse scan at {} positions, {:.1}s windows, ±{}s range",
            anchors.len(),
            scan_window,
            config.max_offset_secs
        );

        let coarse_grid = symmetric_grid(config.max_offset_secs, config.coarse_step_secs);
        let mut outcomes = Vec::with_capacity(anchors.len());

        for (idx, &anchor) in anchors.iter().enumerate() {
            tracing::info!(
                "scan position {}/{}: anchor {:.1}s",
                idx + 1,
                anchors.len(),
                anchor
            );
            let outcome = sweep(
                reference,
                comparison,
                self.extractor,
                anchor,
                scan_window,
                &coarse_grid,
                &config.weights,
            )?;
            tracing::info!(
                "  best lag {:+.1}s, score {:.4}",
                outcome.best.offset_secs,
                outcome.best.score
            );
            outcomes.push(outcome);
        }

        let Some(selection) = select_scan_position(&outcomes) else {
            return Err(SyncError::InvalidDuration(
                "no scan positions available".to_string(),
            ));
        };

        if selection.score_range < config.ambiguity_threshold {
            tracing::warn!(
                "coarse score range {:.4} is below {:.2}; content may be periodic and the \
                 detected offset ambiguous",
                selection.score_range,
                config.ambiguity_threshold
            );
        }

        let winner = &outcomes[selection.index];
        tracing::info!(
            "phase 2: fine search ±{}s around {:+.1}s (anchor {:.1}s)",
            config.fine_radius_secs,
            winner.best.offset_secs,
            winner.anchor_secs
        );

        let fine_grid = centered_grid(
            winner.best.offset_secs,
            config.fine_radius_secs,
            config.fine_step_secs,
        );
        let fine = sweep(
            reference,
            comparison,
            self.extractor,
            winner.anchor_secs,
            scan_window,
            &fine_grid,
            &config.weights,
        )?;

        tracing::info!(
            "fine search: lag {:+.3}s, score {:.4}",
            fine.best.offset_secs,
            fine.best.score
        );

        tracing::info!(
            "phase 3: verifying lag {:+.3}s at {} checkpoints",
            fine.best.offset_secs,
            config.checkpoint_positions.len()
        );
        let checkpoints = verify_checkpoints(
            reference,
            comparison,
            self.extractor,
            fine.best.offset_secs,
            timeline_secs,
            config,
        );

        let report = SyncReport::from_verified_search(fine.best, checkpoints);
        tracing::info!(
            "final: offset {:+.3}s, confidence {:.4} ({})",
            report.offset_secs,
            report.confidence,
            report.quality
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SpectralExtractor;
    use crate::report::Quality;
    use std::f64::consts::PI;

    fn chirp(duration_secs: f64, sample_rate: u32) -> Vec<f64> {
        let n = (duration_secs * sample_rate as f64) as usize;
        (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (2.0 * PI * (180.0 * t + 8.0 * t * t)).sin()
            })
            .collect()
    }

    fn fast_config() -> SyncConfig {
        SyncConfig {
            sample_rate: 4000,
            max_offset_secs: 4.0,
            coarse_step_secs: 1.0,
            fine_step_secs: 0.1,
            fine_radius_secs: 1.0,
            sample_duration_secs: 2.0,
            ..SyncConfig::default()
        }
    }

    #[test]
    fn rejects_non_positive_timeline() {
        let config = fast_config();
        let extractor = SpectralExtractor::new();
        let engine = SyncEngine::new(&config, &extractor);
        let track = AudioTrack::from_samples(chirp(10.0, 4000), 4000);

        let result = engine.synchronize(&track, &track, 0.0, SyncMode::Simple);
        assert!(matches!(result, Err(SyncError::InvalidDuration(_))));

        let result = engine.synchronize(&track, &track, f64::NAN, SyncMode::Simple);
        assert!(matches!(result, Err(SyncError::InvalidDuration(_))));
    }

    #[test]
    fn single_pass_detects_known_delay() {
        let sample_rate = 4000;
        let delay_secs = 1.5;
        let original = chirp(12.0, sample_rate);

        let mut delayed = vec![0.0; (delay_secs * sample_rate as f64) as usize];
        delayed.extend_from_slice(&original);

        let reference = AudioTrack::from_samples(original, sample_rate);
        let comparison = AudioTrack::from_samples(delayed, sample_rate);

        let config = fast_config();
        let extractor = SpectralExtractor::new();
        let engine = SyncEngine::new(&config, &extractor);

        let report = engine
            .synchronize(&reference, &comparison, 12.0, SyncMode::Simple)
            .unwrap();

        // Comparison lags by 1.5s, so the corrective shift is -1.5s
        assert!(
            (report.offset_secs + delay_secs).abs() < 0.1 + 1e-9,
            "expected ~-1.5s, got {}",
            report.offset_secs
        );
        assert!(report.confidence > 0.8);
        assert_eq!(report.quality, Quality::Excellent);
        assert!(report.checkpoints.is_none());
    }

    #[test]
    fn identical_tracks_report_zero_offset() {
        let track = AudioTrack::from_samples(chirp(10.0, 4000), 4000);
        let config = fast_config();
        let extractor = SpectralExtractor::new();
        let engine = SyncEngine::new(&config, &extractor);

        let report = engine
            .synchronize(&track, &track, 10.0, SyncMode::Simple)
            .unwrap();

        assert_eq!(report.offset_secs, 0.0);
        assert!(report.confidence > 0.99);
    }
}
