//! Diagnostic tracing for the `pathexpr` binary.
//!
//! The library only emits `tracing` events; nothing is printed unless a
//! subscriber is installed. Query results and diffs go to stdout, logs to
//! stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the level is `warn`, raised to
/// `info`/`debug`/`trace` by `verbosity`.
///
/// ```bash
/// RUST_LOG=pathexpr=debug pathexpr query '//File()'
/// ```
pub fn init(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
