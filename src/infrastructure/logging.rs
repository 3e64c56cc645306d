//! Logging configuration
//!
//! Initializes tracing for the application. Logs go to stderr so that
//! `--json` output on stdout stays machine readable.

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "RELNOTES_LOG";

/// Initializes logging with the specified level
///
/// `RELNOTES_LOG`, then `RUST_LOG`, take precedence over `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level));

    // a subscriber may already be installed (tests, embedding)
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
