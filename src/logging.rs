//! Tracing setup for the vault.
//!
//! Under systemd on Linux the subscriber writes straight to journald; on
//! other platforms, or when no journal socket is reachable, output goes to a
//! daily-rolled file under the configured log directory. The level filter
//! comes from `PHOTOVAULT_LOG` and defaults to `info`.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Handle for the background file writer. File logging stops and flushes
/// when this drops, so the caller keeps it alive for the whole process.
/// Journald needs no writer thread, in which case the handle is empty.
pub struct LogGuard {
    _file_writer: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Install the global subscriber. Call once at startup, before the vault
/// logs anything; the returned guard must outlive all logging.
pub fn init(config: &Config) -> Result<LogGuard> {
    let filter =
        EnvFilter::try_from_env("PHOTOVAULT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(target_os = "linux")]
    if let Ok(journald) = tracing_journald::layer() {
        tracing_subscriber::registry()
            .with(filter)
            .with(journald)
            .init();
        tracing::debug!("logging to journald");
        return Ok(LogGuard { _file_writer: None });
    }

    init_rolling_file(config, filter)
}

fn init_rolling_file(config: &Config, filter: EnvFilter) -> Result<LogGuard> {
    std::fs::create_dir_all(&config.log_dir)?;

    let appender = tracing_appender::rolling::daily(&config.log_dir, "photovault.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();

    tracing::debug!(dir = %config.log_dir.display(), "logging to rolling file");
    Ok(LogGuard {
        _file_writer: Some(guard),
    })
}
