//! Final result assembly and quality grading.
//!
//! Sign convention: sweeps find the *lag*, i.e. where the comparison
//! track's matching content sits relative to the reference anchor
//! (positive = later). The reported `offset` is the corrective shift to
//! apply to the comparison track, the negation of the lag.

use serde::{Deserialize, Serialize};

use crate::search::{Checkpoint, OffsetCandidate, SyncMode};

/// Graded confidence label.
///
/// Thresholds are strict greater-than: 0.80 itself grades "good".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Quality {
    /// Grade a confidence value.
    pub fn grade(confidence: f64) -> Self {
        if confidence > 0.8 {
            Quality::Excellent
        } else if confidence > 0.6 {
            Quality::Good
        } else if confidence > 0.4 {
            Quality::Fair
        } else {
            Quality::Poor
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Excellent => write!(f, "excellent"),
            Quality::Good => write!(f, "good"),
            Quality::Fair => write!(f, "fair"),
            Quality::Poor => write!(f, "poor"),
        }
    }
}

/// Final synchronization result, the run's sole durable artifact.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Corrective shift for the comparison track, in seconds.
    #[serde(rename = "offset")]
    pub offset_secs: f64,
    /// Overall confidence in [0,1].
    pub confidence: f64,
    /// Graded confidence label.
    pub quality: Quality,
    /// Search mode that produced this result.
    pub mode: SyncMode,
    /// Fine-search best score (multi-checkpoint mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_score: Option<f64>,
    /// Mean checkpoint confidence (multi-checkpoint mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_score: Option<f64>,
    /// Individual checkpoints (multi-checkpoint mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoints: Option<Vec<Checkpoint>>,
}

impl SyncReport {
    /// Result of a single-pass search: the best score is the confidence.
    pub fn from_single_pass(best: OffsetCandidate) -> Self {
        Self {
            offset_secs: corrective_shift(best.offset_secs),
            confidence: best.score,
            quality: Quality::grade(best.score),
            mode: SyncMode::Simple,
            scan_score: None,
            verification_score: None,
            checkpoints: None,
        }
    }

    /// Result of a verified multi-checkpoint search.
    ///
    /// Final confidence is the mean of the fine-search score and the mean
    /// checkpoint confidence; an empty checkpoint list contributes 0.
    pub fn from_verified_search(best: OffsetCandidate, checkpoints: Vec<Checkpoint>) -> Self {
        let verification = mean_confidence(&checkpoints);
        let confidence = (best.score + verification) / 2.0;
        Self {
            offset_secs: corrective_shift(best.offset_secs),
            confidence,
            quality: Quality::grade(confidence),
            mode: SyncMode::MultiCheckpoint,
            scan_score: Some(best.score),
            verification_score: Some(verification),
            checkpoints: Some(checkpoints),
        }
    }
}

/// Mean checkpoint confidence, 0 for an empty list.
fn mean_confidence(checkpoints: &[Checkpoint]) -> f64 {
    if checkpoints.is_empty() {
        return 0.0;
    }
    checkpoints.iter().map(|c| c.confidence).sum::<f64>() / checkpoints.len() as f64
}

/// Negate a lag without emitting -0.0 for a zero lag.
fn corrective_shift(lag_secs: f64) -> f64 {
    if lag_secs == 0.0 {
        0.0
    } else {
        -lag_secs
    }
}
