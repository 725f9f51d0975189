//! Tracing subscriber setup.
//!
//! The filter is read from `PLASH_LOG`, then `RUST_LOG`, and falls back to
//! [`DEFAULT_FILTER`].

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "PLASH_LOG";

/// Filter used when neither environment variable is set.
pub const DEFAULT_FILTER: &str = "plash_lib=info,plash=info";

/// Builds the env filter from the environment.
fn build_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global tracing subscriber.
///
/// Logs go to stderr so CLI output on stdout stays machine readable.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::registry().with(build_filter()).with(fmt_layer).try_init();
}
