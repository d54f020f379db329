//! Tracing subscriber setup for the binary.

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a fmt subscriber. `RUST_LOG` takes precedence; otherwise the
/// level is `info`, or `debug` when `verbose` is set.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::Uptime::default())
        .with_target(false)
        .finish()
        .try_init();
}
