//! Tracing subscriber setup for the binary

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Output format of log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("creating log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("installing tracing subscriber: {0}")]
    Init(String),
}

/// Builds the level filter: `RUST_LOG` wins, then `level`, then `info`
fn build_filter(rust_log: Option<String>, level: &str) -> EnvFilter {
    if let Some(directives) = rust_log
        && let Ok(filter) = directives.parse::<EnvFilter>()
    {
        return filter;
    }

    level.parse::<EnvFilter>().unwrap_or_else(|e| {
        eprintln!("WARN: log level '{}' is not a valid filter ({}); falling back to 'info'", level, e);
        EnvFilter::new("info")
    })
}

fn file_writer(path: &Path) -> Result<(BoxMakeWriter, WorkerGuard), LoggingError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("latestver.log"));
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    Ok((BoxMakeWriter::new(writer), guard))
}

/// Installs the global subscriber
///
/// Logs go to stderr, or to `file` through a non-blocking writer. The
/// returned guard must be held until exit so buffered lines get flushed.
pub fn init(
    level: &str,
    format: LogFormat,
    file: Option<&Path>,
) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = build_filter(std::env::var("RUST_LOG").ok(), level);

    let (writer, guard) = match file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            (writer, Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(file.is_none())
        .with_writer(writer);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(guard)
}
