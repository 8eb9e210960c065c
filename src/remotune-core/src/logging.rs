use crate::{config::LoggingConfig, paths::AppDirs};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "remotune.log";

/// Environment variable that overrides the configured level with a full
/// filter directive, e.g. `remotune_osa=trace,info`.
pub const LOG_ENV: &str = "REMOTUNE_LOG";

/// Keeps the background file writer alive; drop it last.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Installs the global subscriber: a daily-rolling file under the log
/// directory, mirrored to stdout when configured.
pub fn init_logging(config: &LoggingConfig, dirs: &AppDirs) -> Result<LoggingGuard, LoggingError> {
    let log_dir = dirs.log_dir();
    fs::create_dir_all(log_dir).map_err(|source| LoggingError::LogDirectory {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let directive = filter_directive(config, std::env::var(LOG_ENV).ok());
    let env_filter = EnvFilter::try_new(&directive)
        .map_err(|source| LoggingError::Filter { directive, source })?;

    let (file_writer, file_guard) = file_writer(config, log_dir)?;
    let writer = if config.stdout {
        BoxMakeWriter::new(
            std::io::stdout
                .with_max_level(tracing::Level::TRACE)
                .and(file_writer),
        )
    } else {
        BoxMakeWriter::new(file_writer)
    };

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(config.stdout)
        .with_writer(writer)
        .try_init()
        .map_err(LoggingError::AlreadyInstalled)?;

    tracing::debug!(log_dir = %log_dir.display(), "logging initialised");
    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn filter_directive(config: &LoggingConfig, override_directive: Option<String>) -> String {
    override_directive
        .map(|directive| directive.trim().to_owned())
        .filter(|directive| !directive.is_empty())
        .unwrap_or_else(|| config.level.as_filter_directive().to_owned())
}

fn file_writer(config: &LoggingConfig, log_dir: &Path) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let file_stem = config.file_name.as_deref().unwrap_or(DEFAULT_LOG_FILE);
    prune_logs(log_dir, file_stem, config.max_log_files.max(1))?;
    let appender = tracing_appender::rolling::daily(log_dir, file_stem);
    Ok(tracing_appender::non_blocking(appender))
}

/// Deletes the oldest rotated files so at most `keep` remain.
fn prune_logs(dir: &Path, file_stem: &str, keep: usize) -> Result<(), LoggingError> {
    let listing = fs::read_dir(dir).map_err(|source| LoggingError::LogDirectory {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut rotated: Vec<(SystemTime, PathBuf)> = listing
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(file_stem))
        .filter_map(|entry| Some((entry.metadata().ok()?.modified().ok()?, entry.path())))
        .collect();
    if rotated.len() <= keep {
        return Ok(());
    }

    rotated.sort();
    let excess = rotated.len() - keep;
    for (_, path) in rotated.into_iter().take(excess) {
        fs::remove_file(&path).map_err(|source| LoggingError::Prune { path, source })?;
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log directory {path} is not usable: {source}")]
    LogDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid log filter {directive:?}: {source}")]
    Filter {
        directive: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to delete old log file {path}: {source}")]
    Prune {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use std::time::Duration;

    #[test]
    fn environment_overrides_configured_level() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            ..LoggingConfig::default()
        };
        assert_eq!(filter_directive(&config, None), "warn");
        assert_eq!(filter_directive(&config, Some("  ".into())), "warn");
        assert_eq!(
            filter_directive(&config, Some("remotune_osa=trace,info".into())),
            "remotune_osa=trace,info"
        );
    }

    #[test]
    fn prune_keeps_newest_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = SystemTime::now() - Duration::from_secs(3_600);
        for day in 1..=4u64 {
            let path = dir.path().join(format!("remotune.log.2026-10-0{day}"));
            let file = fs::File::create(&path).expect("create log");
            file.set_modified(base + Duration::from_secs(day * 60))
                .expect("set mtime");
        }
        fs::write(dir.path().join("unrelated.txt"), "keep").expect("write");

        prune_logs(dir.path(), "remotune.log", 2).expect("prune");

        let mut remaining: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            [
                "remotune.log.2026-10-03",
                "remotune.log.2026-10-04",
                "unrelated.txt"
            ]
        );
    }
}
