//! Tracing setup. The engine itself only emits `tracing` events; wiring up a
//! subscriber is the host application's job, but a sane default is provided
//! for binaries and tests that don't want to think about it.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber reading its filter from `AXIOM_LOG`, falling
/// back to `default_filter` (typically `"info"`) if unset or invalid.
///
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env("AXIOM_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
