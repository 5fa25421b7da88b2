//! Logging setup for hosts embedding the analyzer
//!
//! The library only emits `tracing` events; nothing is printed until a
//! host installs a subscriber, e.g. with [`init`].

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`, falling back
/// to `default_level` (e.g. `"info"`, `"connascence=debug"`).
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(default_level: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()
        .is_ok()
}
