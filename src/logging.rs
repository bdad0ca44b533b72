//! Diagnostic logging.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a stderr subscriber for the client's tracing output.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Calling it again after a
/// subscriber is installed has no effect.
///
/// ```bash
/// RUST_LOG=agave_engine=debug,agave_transport=debug my-tool
/// ```
pub fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

  let _ = tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(std::io::stderr).compact())
    .try_init();
}
