//! Subscriber setup for `tracing` output.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,meshcombine=debug,meshcombine_core=debug";

/// Install a formatting subscriber filtered by `RUST_LOG`, or [`DEFAULT_FILTER`].
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

/// Install a formatting subscriber with an explicit filter directive string.
pub fn init_with_filter(directives: &str) {
    install(EnvFilter::new(directives));
}

fn install(filter: EnvFilter) {
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::trace!("global subscriber already installed");
    }
}
