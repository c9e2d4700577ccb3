//! Structured logging setup via the `tracing` ecosystem.
//!
//! Filtering follows `RUST_LOG` and defaults to `info`; dispatch-level
//! noise (`batch delivered`, per-client drops) sits at `trace`/`debug`
//! so a default deployment logs lifecycle events only.

/// Installs the global `tracing-subscriber` fmt subscriber.
///
/// Call once, before the first log line. Panics if a global
/// subscriber is already set.
pub fn init_telemetry() {
    use tracing_subscriber::{EnvFilter, fmt};

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .with_thread_ids(true)
        .init();
}
