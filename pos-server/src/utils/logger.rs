//! Logging Infrastructure
//!
//! `tracing-subscriber` with env filter, optional JSON output and a daily
//! rolling file under `{WORK_DIR}/logs`.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logger with optional file output
///
/// `RUST_LOG` wins over `log_level`. The returned guard must be kept alive
/// for the file writer to flush.
pub fn init_logger_with_file(
    log_level: Option<&str>,
    json: bool,
    log_dir: Option<&str>,
) -> Option<WorkerGuard> {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},sqlx=warn,tower_http=info")));

    let (file_writer, guard) = match log_dir.map(Path::new) {
        Some(dir) if dir.exists() => {
            let appender = tracing_appender::rolling::daily(dir, "pos-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        _ => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(fmt::layer().json().with_target(true))
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false))
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("Logger already initialized: {e}");
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_output_returns_guard_only_for_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let guard = init_logger_with_file(Some("debug"), false, dir.path().to_str());
        assert!(guard.is_some());

        let missing = dir.path().join("missing");
        assert!(init_logger_with_file(None, true, missing.to_str()).is_none());
    }
}
