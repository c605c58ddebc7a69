//! Offset grid construction.
//!
//! Pure functions that build the closed candidate grids swept by the
//! search phases. Grid length is always `round(2·radius/step) + 1`, so
//! curves can be checked against the expected size.

/// Closed symmetric grid `[-max_offset, +max_offset]`.
pub fn symmetric_grid(max_offset_secs: f64, step_secs: f64) -> Vec<f64> {
    centered_grid(0.0, max_offset_secs, step_secs)
}

/// Closed grid `[center - radius, center + radius]`.
pub fn centered_grid(center_secs: f64, radius_secs: f64, step_secs: f64) -> Vec<f64> {
    let count = (2.0 * radius_secs / step_secs).round() as usize + 1;
    (0..count)
        .map(|i| center_secs - radius_secs + i as f64 * step_secs)
        .collect()
}
