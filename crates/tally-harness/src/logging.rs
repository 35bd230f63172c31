//! Tracing subscriber for suite binaries
//!
//! `RUST_LOG` selects what is logged; without it only warnings (timeouts,
//! protocol violations, failed assertions) reach stderr. `--verbose` raises
//! the default to debug.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
