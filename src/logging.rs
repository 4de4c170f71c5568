//! Tracing initialization.
//!
//! Every indexing run, reindex, context pack build, and memory promotion
//! opens a `tracing` span so a single run can be followed through logs even
//! when several projects are being indexed concurrently.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global tracing subscriber for the process.
///
/// `RUST_LOG`, if set, takes precedence over `config.level`. When
/// `config.json` is set the subscriber emits newline-delimited JSON
/// suitable for log aggregation; otherwise it emits human-readable text to
/// stderr.
///
/// Returns the [`tracing_appender::non_blocking::WorkerGuard`] that must be
/// kept alive for the process lifetime, or logging silently stops once it
/// is dropped.
pub fn init_tracing(config: &LoggingConfig) -> tracing_appender::non_blocking::WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(fmt::layer().json().with_writer(non_blocking))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(non_blocking))
            .init();
    }

    guard
}
