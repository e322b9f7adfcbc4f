use crate::config::LoggingConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, EnvFilter};

/// Keeps the background log writer alive; drop it to flush.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Installs a global subscriber writing to `config.file`.
///
/// Stdout carries the protocol response, so the log file is the only sink.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let env_filter = EnvFilter::try_new(config.level.as_filter_directive()).map_err(|source| {
        LoggingError::ParseLevel {
            level: config.level.as_filter_directive().to_string(),
            source,
        }
    })?;

    let (writer, guard) = build_file_writer(&config.file)?;

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(LoggingError::SubscriberInstall)?;

    Ok(LoggingGuard { _file_guard: guard })
}

fn build_file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath {
            path: path.to_path_buf(),
        })?;
    let log_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateDirectory {
        path: log_dir.clone(),
        source,
    })?;

    let appender = tracing_appender::rolling::never(&log_dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log path {path} does not name a file")]
    InvalidPath { path: PathBuf },
    #[error("failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse log level {level}: {source}")]
    ParseLevel {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInstall(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn filter_directive_is_lowercase() {
        assert_eq!(LogLevel::Info.as_filter_directive(), "info");
    }

    #[test]
    fn log_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("smuggler.log");
        let (_writer, _guard) = build_file_writer(&path).expect("writer should build");
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn directory_path_is_rejected() {
        let result = build_file_writer(Path::new("/"));
        assert!(matches!(result, Err(LoggingError::InvalidPath { .. })));
    }
}
