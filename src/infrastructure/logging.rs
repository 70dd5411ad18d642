//! Logging configuration
//!
//! Initializes tracing for the plugin. CI systems timestamp and route
//! the output themselves, so the format stays plain.

/// Initializes logging with the given default level.
///
/// `RUST_LOG` overrides the default when set, following the usual
/// env-filter syntax.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
