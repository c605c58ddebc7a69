//! Scan-position heuristics and selection.
//!
//! The multi-position coarse pass anchors at several independent points
//! on the timeline and keeps the one whose sweep scored highest.

use super::sweep::SweepOutcome;

/// Heuristic anchor positions for the coarse pass.
///
/// Long timelines anchor near the start, middle, and end (clear of the
/// search range at both edges); short ones fall back to quartiles.
pub fn scan_positions(timeline_secs: f64, scan_window_secs: f64, long_timeline_secs: f64) -> Vec<f64> {
    if timeline_secs >= long_timeline_secs {
        vec![
            (timeline_secs * 0.2).max(15.0),
            timeline_secs * 0.5,
            (timeline_secs - 35.0).max(timeline_secs * 0.8),
        ]
    } else {
        vec![
            (timeline_secs * 0.25).max(5.0),
            timeline_secs * 0.5,
            (timeline_secs * 0.75).min(timeline_secs - scan_window_secs - 5.0),
        ]
    }
}

/// The winning scan position and its curve diagnostic.
#[derive(Debug, Clone, Copy)]
pub struct ScanSelection {
    /// Index of the winning outcome.
    pub index: usize,
    /// Score spread of the winner's coarse curve. A spread below the
    /// ambiguity threshold signals periodic content (e.g. music).
    pub score_range: f64,
}

/// Pick the outcome with the highest best-score; ties keep the earliest
/// position.
pub fn select_scan_position(outcomes: &[SweepOutcome]) -> Option<ScanSelection> {
    if outcomes.is_empty() {
        return None;
    }

    let mut index = 0;
    for (i, outcome) in outcomes.iter().enumerate().skip(1) {
        if outcome.best.score > outcomes[index].best.score {
            index = i;
        }
    }

    Some(ScanSelection {
        index,
        score_range: outcomes[index].score_range(),
    })
}
