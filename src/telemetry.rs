//! Logging setup shared by the binaries.
//!
//! `CARDIOLENS_LOG_MODE` selects the sink:
//! - `stdout`: log to standard output
//! - `file`: append to `CARDIOLENS_LOG_FILE` (or the caller's default path)
//! - `auto` (default): standard output
//!
//! Verbosity follows `RUST_LOG`, defaulting to `info`.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_MODE_ENV: &str = "CARDIOLENS_LOG_MODE";
pub const LOG_FILE_ENV: &str = "CARDIOLENS_LOG_FILE";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stdout,
    File(PathBuf),
}

impl LogSink {
    /// Resolve the sink from the mode and file settings.
    #[must_use]
    pub fn resolve(mode: Option<&str>, file: Option<&str>, default_file: &Path) -> Self {
        match mode.unwrap_or("auto") {
            "file" => Self::File(file.map_or_else(|| default_file.to_path_buf(), PathBuf::from)),
            // stdout, auto
            _ => Self::Stdout,
        }
    }

    #[must_use]
    pub fn from_env(default_file: &Path) -> Self {
        let mode = std::env::var(LOG_MODE_ENV).ok();
        let file = std::env::var(LOG_FILE_ENV).ok();
        Self::resolve(mode.as_deref(), file.as_deref(), default_file)
    }
}

/// Install the global subscriber.
///
/// The returned guard must be held for the life of the process; dropping it
/// flushes and stops the background writer.
///
/// # Errors
/// Returns error if the log file cannot be opened.
pub fn init(default_file: &Path) -> std::io::Result<WorkerGuard> {
    let sink = LogSink::from_env(default_file);
    let (writer, guard) = match &sink {
        LogSink::File(path) => {
            if let Some(parent) = path.parent() {
                // Best-effort: a missing directory surfaces as an open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        LogSink::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    if let LogSink::File(path) = &sink {
        tracing::info!("Logging to {:?}", path);
    }
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_resolution() {
        let default = Path::new("logs/cardiolens.log");
        assert_eq!(LogSink::resolve(None, None, default), LogSink::Stdout);
        assert_eq!(LogSink::resolve(Some("auto"), None, default), LogSink::Stdout);
        assert_eq!(LogSink::resolve(Some("stdout"), Some("x.log"), default), LogSink::Stdout);
        assert_eq!(
            LogSink::resolve(Some("file"), None, default),
            LogSink::File(default.to_path_buf())
        );
        assert_eq!(
            LogSink::resolve(Some("file"), Some("/var/log/c.log"), default),
            LogSink::File(PathBuf::from("/var/log/c.log"))
        );
    }
}
