//! Hierarchical offset search.
//!
//! The engine composes pure pieces in three strictly ordered phases:
//!
//! 1. **Coarse scan** (`sweep`): score a closed offset grid against an
//!    anchor window, at one or more independent scan positions.
//! 2. **Fine refinement** (`sweep` again): re-score a dense grid around
//!    the coarse winner at the same anchor.
//! 3. **Checkpoint verification** (`checkpoints`): re-validate the chosen
//!    lag at independent timeline points.
//!
//! Grid construction (`grid`) and anchor placement (`positions`) are
//! deterministic pure functions so every phase can be tested in
//! isolation.

mod checkpoints;
mod engine;
mod grid;
mod positions;
mod sweep;

pub use checkpoints::{verify_checkpoints, Checkpoint, CheckpointQuality};
pub use engine::{SyncEngine, SyncMode};
pub use grid::{centered_grid, symmetric_grid};
pub use positions::{scan_positions, select_scan_position, ScanSelection};
pub use sweep::{sweep, OffsetCandidate, SweepOutcome};
