//! Engine configuration.
//!
//! All tunable values live in one immutable `SyncConfig` passed into the
//! search engine, so test fixtures can pin every knob explicitly.

use serde::{Deserialize, Serialize};

use crate::scoring::ScoreWeights;

/// Configuration for the offset search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Analysis sample rate in Hz. All tracks are decoded to this rate.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Maximum offset magnitude to search, in seconds.
    #[serde(default = "default_max_offset")]
    pub max_offset_secs: f64,

    /// Step size of the coarse sweep in seconds.
    #[serde(default = "default_coarse_step")]
    pub coarse_step_secs: f64,

    /// Step size of the fine sweep in seconds.
    #[serde(default = "default_fine_step")]
    pub fine_step_secs: f64,

    /// Radius of the fine sweep around the coarse winner, in seconds.
    #[serde(default = "default_fine_radius")]
    pub fine_radius_secs: f64,

    /// Window length for single-pass anchors and checkpoint samples.
    #[serde(default = "default_sample_duration")]
    pub sample_duration_secs: f64,

    /// Upper bound on the multi-position scan window length.
    #[serde(default = "default_scan_window_max")]
    pub scan_window_max_secs: f64,

    /// Scan window length as a fraction of the timeline.
    #[serde(default = "default_scan_window_fraction")]
    pub scan_window_fraction: f64,

    /// Timelines at least this long use the near-start/middle/near-end
    /// anchor heuristic; shorter ones fall back to quartile anchors.
    #[serde(default = "default_long_timeline")]
    pub long_timeline_secs: f64,

    /// Relative positions (0-1) of the verification checkpoints.
    #[serde(default = "default_checkpoint_positions")]
    pub checkpoint_positions: Vec<f64>,

    /// Coarse curves with a score range below this are flagged as
    /// ambiguous (periodic content such as music).
    #[serde(default = "default_ambiguity_threshold")]
    pub ambiguity_threshold: f64,

    /// Component weights for combined similarity.
    #[serde(default)]
    pub weights: ScoreWeights,
}

fn default_sample_rate() -> u32 {
    crate::audio::DEFAULT_ANALYSIS_SAMPLE_RATE
}

fn default_max_offset() -> f64 {
    30.0
}

fn default_coarse_step() -> f64 {
    1.0
}

fn default_fine_step() -> f64 {
    0.1
}

fn default_fine_radius() -> f64 {
    5.0
}

fn default_sample_duration() -> f64 {
    5.0
}

fn default_scan_window_max() -> f64 {
    15.0
}

fn default_scan_window_fraction() -> f64 {
    0.15
}

fn default_long_timeline() -> f64 {
    40.0
}

fn default_checkpoint_positions() -> Vec<f64> {
    vec![0.25, 0.5, 0.75]
}

fn default_ambiguity_threshold() -> f64 {
    0.1
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            max_offset_secs: default_max_offset(),
            coarse_step_secs: default_coarse_step(),
            fine_step_secs: default_fine_step(),
            fine_radius_secs: default_fine_radius(),
            sample_duration_secs: default_sample_duration(),
            scan_window_max_secs: default_scan_window_max(),
            scan_window_fraction: default_scan_window_fraction(),
            long_timeline_secs: default_long_timeline(),
            checkpoint_positions: default_checkpoint_positions(),
            ambiguity_threshold: default_ambiguity_threshold(),
            weights: ScoreWeights::default(),
        }
    }
}

impl SyncConfig {
    /// Scan window length for a given timeline.
    pub fn scan_window_secs(&self, timeline_secs: f64) -> f64 {
        self.scan_window_max_secs
            .min(timeline_secs * self.scan_window_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SyncConfig::default();
        assert_eq!(config.sample_rate, 22050);
        assert_eq!(config.max_offset_secs, 30.0);
        assert_eq!(config.coarse_step_secs, 1.0);
        assert_eq!(config.fine_step_secs, 0.1);
        assert_eq!(config.fine_radius_secs, 5.0);
        assert_eq!(config.sample_duration_secs, 5.0);
        assert_eq!(config.checkpoint_positions, vec![0.25, 0.5, 0.75]);
    }

    #[test]
    fn scan_window_caps_at_max() {
        let config = SyncConfig::default();
        // 15% of 60s = 9s, below the 15s cap
        assert!((config.scan_window_secs(60.0) - 9.0).abs() < 1e-9);
        // 15% of 200s = 30s, capped at 15s
        assert!((config.scan_window_secs(200.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let parsed: SyncConfig = serde_json::from_str("{\"max_offset_secs\": 10.0}").unwrap();
        assert_eq!(parsed.max_offset_secs, 10.0);
        assert_eq!(parsed.sample_rate, 22050);
        assert_eq!(parsed.fine_step_secs, 0.1);
    }
}
