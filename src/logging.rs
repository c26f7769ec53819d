//! File-based logging
//!
//! The terminal is owned by the surface host, so tracing output goes to a
//! daily-rolling file instead of stdout.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_DIR: &str = ".logs";
const LOG_FILE_PREFIX: &str = "nvim-spotify";
const DEFAULT_FILTER: &str = "nvim_spotify=debug,rspotify=info,warn";

/// Initialize the logging system.
///
/// Logs are written to `.logs/nvim-spotify.YYYY-MM-DD.log` with daily rotation.
/// `RUST_LOG` overrides the default filter:
/// - `nvim_spotify` modules: DEBUG
/// - `rspotify`: INFO
/// - Other crates: WARN
pub fn init_logging() -> anyhow::Result<()> {
    let log_dir = Path::new(LOG_DIR);
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes on drop; it has to outlive every log call
    Box::leak(Box::new(guard));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!("Logging initialized - logs written to {}/", LOG_DIR);

    Ok(())
}

/// Log the outcome of a backend call
#[macro_export]
macro_rules! log_backend_result {
    ($backend:expr, $operation:expr, $result:expr) => {
        match &$result {
            Ok(_) => tracing::debug!(
                backend = $backend,
                operation = $operation,
                "Backend call succeeded"
            ),
            Err(e) => tracing::warn!(
                backend = $backend,
                operation = $operation,
                error = %e,
                "Backend call failed"
            ),
        }
    };
}

/// Log the start of a backend call with additional context
#[macro_export]
macro_rules! log_backend_request {
    ($backend:expr, $operation:expr) => {
        tracing::debug!(backend = $backend, operation = $operation, "Backend call started");
    };
    ($backend:expr, $operation:expr, $($field:tt)*) => {
        tracing::debug!(
            backend = $backend,
            operation = $operation,
            $($field)*,
            "Backend call started"
        );
    };
}
