//! tracksync - locate the temporal offset between two recordings of the
//! same event (e.g. a camera's reference track and a separately captured
//! higher-quality track) so they can later be aligned.
//!
//! # Architecture
//!
//! The pipeline composes pure pieces that the engine drives in order:
//!
//! 1. **Decoding** (`audio`): decode each source once to mono f64 at the
//!    analysis sample rate; slice analysis windows from memory.
//! 2. **Feature extraction** (`features`): one window to an immutable
//!    `FeatureSet` (mel/chroma/MFCC and friends), behind a trait seam.
//! 3. **Scoring** (`scoring`): two feature sets to a similarity score;
//!    all four components are always computed.
//! 4. **Search** (`search`): coarse-to-fine grid sweeps over candidate
//!    offsets, scan-position selection, checkpoint verification.
//! 5. **Reporting** (`report`): aggregation into one graded `SyncReport`.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use tracksync::{load_track, SpectralExtractor, SyncConfig, SyncEngine, SyncMode};
//!
//! let config = SyncConfig::default();
//! let reference = load_track(Path::new("camera.mp4"), config.sample_rate)?;
//! let comparison = load_track(Path::new("recorder.wav"), config.sample_rate)?;
//!
//! let extractor = SpectralExtractor::new();
//! let engine = SyncEngine::new(&config, &extractor);
//! let report = engine.synchronize(&reference, &comparison, 120.0, SyncMode::MultiCheckpoint)?;
//!
//! println!("shift comparison by {:+.3}s ({})", report.offset_secs, report.quality);
//! # Ok::<(), tracksync::SyncError>(())
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod report;
pub mod scoring;
pub mod search;

pub use audio::{load_track, probe_duration, AudioTrack, DEFAULT_ANALYSIS_SAMPLE_RATE};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use features::{FeatureExtractor, FeatureSet, SpectralExtractor};
pub use report::{Quality, SyncReport};
pub use scoring::{ScoreBreakdown, ScoreMethod, ScoreWeights};
pub use search::{Checkpoint, CheckpointQuality, SyncEngine, SyncMode};
