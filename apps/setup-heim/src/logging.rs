//! Log output for the runner console.
//!
//! The filter comes from `SETUP_HEIM_LOG` when it parses, otherwise from
//! the runner's debug switch. Output goes to stdout without timestamps since
//! the runner stamps every line itself.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Environment variable holding an explicit filter directive.
pub const LOG_FILTER_ENV: &str = "SETUP_HEIM_LOG";

/// Builds the filter for this run.
#[must_use]
pub fn filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| default_filter(debug))
}

fn default_filter(debug: bool) -> EnvFilter {
    let level = if debug { "debug" } else { "info" };
    EnvFilter::new(format!("setup_heim={level}"))
}

/// Installs the global subscriber. Calling it twice is a no-op.
pub fn init(debug: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter(debug))
        .with(fmt_layer)
        .try_init();
}
