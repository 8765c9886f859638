use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;

/// Installs the tracing stack: stderr always, plus a daily-rolling file when
/// `log_directory` is configured. The returned guard must be held for the
/// lifetime of the process, otherwise buffered file output is lost.
pub fn init(config: &AppConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter).with(stderr_layer);

    match &config.log_directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {dir}"))?;
            let appender = tracing_appender::rolling::daily(dir, "banwatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .try_init()
                .context("failed to install tracing subscriber")?;
            Ok(Some(guard))
        }
        None => {
            registry
                .try_init()
                .context("failed to install tracing subscriber")?;
            Ok(None)
        }
    }
}
