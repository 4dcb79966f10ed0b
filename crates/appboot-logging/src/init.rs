//! Subscriber installation

use crate::{LogFormat, LogLevel};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Environment variable holding an `EnvFilter` directive that overrides the
/// configured level (e.g. `APPBOOT_LOG=appboot_bundle=trace`).
pub const LOG_ENV: &str = "APPBOOT_LOG";

/// Build the filter: [`LOG_ENV`] if set and valid, `level` otherwise.
fn build_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

/// Initialize logging to stderr.
///
/// Call this once during startup, before selection runs. Returns `false` if a
/// global subscriber was already installed, in which case nothing changes.
pub fn init_logging(level: LogLevel, format: LogFormat) -> bool {
    let filter = build_filter(level);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = match format {
        LogFormat::Full => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.compact().without_time())
            .try_init(),
    };

    installed.is_ok()
}
