//! Shared runtime utilities: logging init.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber. Honors `RUST_LOG`, defaulting to
/// `info`. Calling twice is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
