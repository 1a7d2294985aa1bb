//! Logging setup
//!
//! Console output plus a persistent, non-blocking file sink. The returned
//! guard must be held for the life of the process or buffered lines are lost.

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt as tfmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File sink line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected text or json)", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Install the global subscriber.
///
/// Level: `level` if given, else `RUST_LOG`, else `info`.
pub fn init_logging(log_file: &Path, format: LogFormat, level: Option<&str>) -> Result<WorkerGuard> {
    let file_name = log_file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("log file path {} has no usable file name", log_file.display()))?;
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .with_context(|| format!("cannot open log file {}", log_file.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = match level {
        Some(level) => EnvFilter::try_new(level).with_context(|| format!("invalid log level '{}'", level))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let console = tfmt::layer().with_target(false);
    let file = match format {
        LogFormat::Text => tfmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .boxed(),
        LogFormat::Json => tfmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::default().to_string(), "text");
    }

    #[test]
    fn test_log_file_without_name_is_rejected() {
        assert!(init_logging(Path::new("/"), LogFormat::Text, None).is_err());
    }

    #[test]
    fn test_unwritable_log_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("plain-file");
        std::fs::write(&not_a_dir, "").unwrap();

        let err = init_logging(&not_a_dir.join("bot.log"), LogFormat::Text, None).unwrap_err();
        assert!(err.to_string().contains("cannot open log file"));
    }
}
