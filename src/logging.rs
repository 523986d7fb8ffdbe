//! Logging setup for the binary.
//!
//! Logs go to stderr so that JSON written to stdout stays machine-readable.
//! Filter precedence: `--debug`, then `RUST_LOG`, then `logging.level`.

use tracing_subscriber::EnvFilter;

use crate::config::Settings;

fn filter_from_settings(settings: &Settings) -> EnvFilter {
    if settings.debug {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.level))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(settings: &Settings) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_from_settings(settings))
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
