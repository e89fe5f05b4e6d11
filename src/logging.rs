use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Overrides the directory the rolling log files go to.
pub const LOG_DIR_ENV: &str = "WEATHER_NOW_LOG_DIR";
pub const DEFAULT_LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "weather-now.log";

/// Directory from `LOG_DIR_ENV`, or `logs/` when it is unset or blank.
pub fn log_dir(env_value: Option<String>) -> PathBuf {
    env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_LOG_DIR), PathBuf::from)
}

/// Filter from `RUST_LOG`, falling back to `info` when it is unset or invalid.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Sends all logs to `<dir>/weather-now.log.<date>`; stdout belongs to the TUI.
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn initialize_logging(dir: impl AsRef<Path>) -> WorkerGuard {
    let dir = dir.as_ref();
    let _ = std::fs::create_dir_all(dir);

    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("Logging to {}", dir.display());
    guard
}
