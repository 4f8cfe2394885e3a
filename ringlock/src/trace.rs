//! Logging hooks for the queue and the driver.
//!
//! Built with `--features tracing`, the crate-internal `trace!`..`error!`
//! macros forward to the `tracing` crate. Without the feature they expand to
//! nothing, so the queue's lock-held sections carry no logging cost.

/// Installs a `tracing` subscriber for the current process.
///
/// The filter comes from `RUST_LOG` and falls back to `ringlock=trace`.
/// Call once, early, from a binary or a test. A no-op without the `tracing`
/// feature.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ringlock=trace"));

    // `try_init` so that a second call (e.g. from another test binary
    // sharing the process) leaves the first subscriber in place.
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init();
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, info, trace, warn};

#[cfg(not(feature = "tracing"))]
macro_rules! log_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use log_noop as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use log_noop as info;
#[cfg(not(feature = "tracing"))]
pub(crate) use log_noop as trace;
#[cfg(not(feature = "tracing"))]
pub(crate) use log_noop as warn;
