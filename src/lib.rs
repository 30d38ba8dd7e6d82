pub mod api;
pub mod models;
pub mod services;

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize the tracing subscriber. Console logging is always on;
/// setting VERITAS_LOG_DIR adds a per-session non-blocking log file.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true);

    let file_layer = std::env::var("VERITAS_LOG_DIR")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .and_then(|dir| {
            let logs_dir = PathBuf::from(dir);
            if let Err(e) = fs::create_dir_all(&logs_dir) {
                eprintln!("Failed to create logs directory: {}", e);
                return None;
            }
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            let log_filename = format!("veritas_{}.log", timestamp);
            let file_appender = rolling::never(&logs_dir, &log_filename);
            let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(file_guard);
            Some(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("=== VERITAS Engine Started ===");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
}
