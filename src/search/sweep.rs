//! Grid sweeps against a fixed anchor window.
//!
//! One sweep extracts the anchor's features once, then scores every
//! candidate offset independently. Candidate evaluations run as a
//! bounded parallel map; scores are materialized in grid order and
//! reduced sequentially, so the ascending-offset tie-break stays
//! deterministic regardless of scheduling.

use rayon::prelude::*;

use crate::audio::AudioTrack;
use crate::error::SyncResult;
use crate::features::{FeatureExtractor, FeatureSet};
use crate::scoring::{ScoreBreakdown, ScoreWeights};

/// One scored offset from a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetCandidate {
    /// Candidate lag in seconds.
    pub offset_secs: f64,
    /// Combined similarity at this lag.
    pub score: f64,
}

/// Full result of sweeping one grid at one anchor.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    /// Anchor position on the reference timeline, in seconds.
    pub anchor_secs: f64,
    /// Winning candidate (ties break toward the earliest grid offset).
    pub best: OffsetCandidate,
    /// Score curve, index-aligned with the input grid.
    pub curve: Vec<OffsetCandidate>,
}

impl SweepOutcome {
    /// Spread of the score curve, a diagnostic for ambiguous content.
    pub fn score_range(&self) -> f64 {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for candidate in &self.curve {
            min = min.min(candidate.score);
            max = max.max(candidate.score);
        }
        if self.curve.is_empty() {
            0.0
        } else {
            max - min
        }
    }
}

/// Sweep a candidate grid against the anchor window at `anchor_secs`.
///
/// The anchor extraction is mandatory: its failure aborts the sweep.
/// Each candidate's comparison window starts at `anchor + offset`;
/// windows outside `[0, comparison_duration - window]` score 0 without
/// extraction, and per-candidate extraction failures also degrade to 0.
/// Every grid entry produces a curve entry; nothing is dropped.
pub fn sweep(
    reference: &AudioTrack,
    comparison: &AudioTrack,
    extractor: &dyn FeatureExtractor,
    anchor_secs: f64,
    window_secs: f64,
    offsets: &[f64],
    weights: &ScoreWeights,
) -> SyncResult<SweepOutcome> {
    let anchor = extractor.extract(reference, anchor_secs, window_secs)?;

    let scores: Vec<f64> = offsets
        .par_iter()
        .map(|&offset| {
            let target = anchor_secs + offset;
            if !comparison.window_fits(target, window_secs) {
                0.0
            } else {
                score_or_zero(&anchor, comparison, extractor, target, window_secs, weights)
            }
        })
        .collect();

    let curve: Vec<OffsetCandidate> = offsets
        .iter()
        .zip(scores)
        .map(|(&offset_secs, score)| OffsetCandidate { offset_secs, score })
        .collect();

    Ok(SweepOutcome {
        anchor_secs,
        best: best_candidate(&curve),
        curve,
    })
}

/// Score one candidate, degrading any failure to 0.
///
/// Range edges commonly yield short or empty windows; a candidate must
/// never abort the sweep it belongs to.
fn score_or_zero(
    anchor: &FeatureSet,
    comparison: &AudioTrack,
    extractor: &dyn FeatureExtractor,
    target_secs: f64,
    window_secs: f64,
    weights: &ScoreWeights,
) -> f64 {
    match extractor
        .extract(comparison, target_secs, window_secs)
        .and_then(|features| ScoreBreakdown::measure(anchor, &features))
    {
        Ok(breakdown) => breakdown.combined(weights),
        Err(err) => {
            tracing::debug!("candidate at {:.2}s scored 0: {}", target_secs, err);
            0.0
        }
    }
}

/// Arg-max over the curve with strict comparison, so equal scores keep
/// the earliest grid offset.
fn best_candidate(curve: &[OffsetCandidate]) -> OffsetCandidate {
    let Some(first) = curve.first() else {
        return OffsetCandidate {
            offset_secs: 0.0,
            score: 0.0,
        };
    };
    let mut best = *first;
    for candidate in &curve[1..] {
        if candidate.score > best.score {
            best = *candidate;
        }
    }
    best
}
