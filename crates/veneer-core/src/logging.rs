//! Logging setup based on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,veneer=debug,winit=info";

/// Install a fmt subscriber, honouring `RUST_LOG` when present.
///
/// Calling this more than once is harmless; only the first call installs
/// a subscriber.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

/// Install a fmt subscriber with an explicit filter directive,
/// e.g. `"veneer=trace"`.
pub fn init_with_filter(directives: &str) {
    install(EnvFilter::new(directives));
}

fn install(filter: EnvFilter) {
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .is_err()
    {
        tracing::trace!("global subscriber already installed");
    }
}
