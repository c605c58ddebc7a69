//! Logging setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Respects the RUST_LOG environment variable and falls back to `info`.
/// Diagnostics go to stdout so that the final JSON object is the last
/// thing written there; fatal errors are reported on stderr by the
/// caller.
///
/// Should be called once at startup.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stdout))
        .with(filter)
        .init();
}
