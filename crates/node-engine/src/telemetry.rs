use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber writing human-formatted
/// records to stderr, honoring `RUST_LOG` and defaulting to `info`.
pub fn init() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init();
}
