//! Error types for sync analysis.

/// Error types for synchronization operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Input file does not exist.
    #[error("source file not found: {0}")]
    SourceNotFound(String),

    /// Timeline duration was not a positive number.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// A requested analysis window contained no samples.
    ///
    /// Raised when the window offset lies at or past the end of the track.
    /// Sweeps recover from this at candidate granularity; mandatory anchor
    /// extractions let it propagate.
    #[error("empty analysis window at {offset_secs:.2}s")]
    EmptyWindow { offset_secs: f64 },

    /// FFmpeg execution failed.
    #[error("ffmpeg error: {0}")]
    Ffmpeg(String),

    /// Audio decoding produced no usable samples.
    #[error("audio decode failed: {0}")]
    Decode(String),

    /// Two feature sets were compared at different sample rates.
    #[error("sample rate mismatch: {reference} vs {comparison}")]
    SampleRateMismatch { reference: u32, comparison: u32 },

    /// IO error from subprocess plumbing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for sync results.
pub type SyncResult<T> = Result<T, SyncError>;
