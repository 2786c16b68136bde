//! Structured logging using **tracing**.
//!
//! Page workers run on Rayon threads, so every event carries the thread id
//! alongside the page URL it concerns. Output is JSON on stderr; stdout is
//! reserved for the report.

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// Call *once* at program start. `RUST_LOG` controls filtering
/// (e.g. `RUST_LOG=deadcss_core=debug`); when it is unset, `fallback` is used.
pub fn init_structured_logging(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A subscriber may already be installed by an embedding program
    let _ = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_current_span(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs a warning event.
pub fn log_warn(message: &str) {
    warn!(detail = %message);
}

/// Logs an info event.
pub fn log_info(message: &str) {
    info!(detail = %message);
}

/// Logs an error event.
pub fn log_error(message: &str) {
    error!(detail = %message);
}
