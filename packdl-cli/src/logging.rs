//! Tracing subscriber setup.

use std::path::Path;

use packdl::config::LogSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::error::CliError;

/// Filter directive for a level name.
///
/// The library and the `packdl` binary share the `packdl` target prefix.
fn directive(level: &str) -> String {
    format!("packdl={level}")
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level; `--verbose` raises the
/// default to `debug`. Console output goes to stderr so it never mixes with
/// command output. When a log file is configured, a second non-blocking
/// writer is added; the returned guard must live until exit.
pub fn init(verbose: bool, settings: &LogSettings) -> Result<Option<WorkerGuard>, CliError> {
    let level = if verbose { "debug" } else { settings.level.as_str() };
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)))
    };

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter());

    let (file_layer, guard) = match &settings.file {
        Some(path) => {
            let (dir, name) = split_log_path(path);
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    Ok(guard)
}

fn split_log_path(path: &Path) -> (&Path, &std::ffi::OsStr) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("packdl.log"));
    (dir, name)
}
