//! Observability
//!
//! Structured logging through `tracing`. Library code only emits events;
//! the binary installs the subscriber once at startup.
//!
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// Events go to stderr so command output on stdout stays machine-readable.
/// Calling this more than once keeps the first subscriber.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
