//! src/logging.rs
//! ============================================================================
//! # Logger: file-only tracing setup
//!
//! The TUI owns the terminal, so every event goes to a daily rolling file in
//! the log directory through a non-blocking writer. `RUST_LOG` overrides the
//! configured level.

use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use tracing::Metadata;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        self, FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    prelude::*,
};

use crate::config::{Config, LoggingConfig};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Invalid log directory: {0}")]
    InvalidLogDirectory(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub struct Logger;

impl Logger {
    /// Call **once** near the start of `main`; keep the guard alive until exit.
    pub fn init(config: &LoggingConfig) -> Result<WorkerGuard, LoggingError> {
        let log_dir: PathBuf = match &config.directory {
            Some(dir) => dir.clone(),
            None => Config::log_dir().map_err(|e| LoggingError::InvalidLogDirectory(e.to_string()))?,
        };
        std::fs::create_dir_all(&log_dir)?;

        // <dir>/<prefix>.YYYY-MM-DD.log
        let file: RollingFileAppender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(config.file_prefix.as_str())
            .filename_suffix("log")
            .max_log_files(config.max_files.max(1))
            .build(&log_dir)
            .map_err(|e| LoggingError::InvalidLogDirectory(format!("{}: {e}", log_dir.display())))?;

        let (writer, guard) = tracing_appender::non_blocking(file);

        let file_layer = fmt::layer()
            .event_format(SeqFileMod)
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(Self::env_filter(&config.level)?);

        tracing_subscriber::registry()
            .with(file_layer)
            .try_init()
            .map_err(|_| LoggingError::AlreadyInitialized)?;

        Ok(guard)
    }

    fn env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(level)
                .map_err(|e| LoggingError::ConfigError(format!("bad log level {level:?}: {e}"))),
        }
    }
}

static SEQ: AtomicUsize = AtomicUsize::new(1);

/// Custom formatter: `SEQ LEVEL [file:line mod::path] message`
struct SeqFileMod;

impl<S, N> FormatEvent<S, N> for SeqFileMod
where
    S: tracing::Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut w: Writer<'_>,
        ev: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let seq: usize = SEQ.fetch_add(1, Ordering::Relaxed);

        let meta: &'static Metadata<'static> = ev.metadata();
        write!(
            w,
            "{seq:06} {:5} [{}:{} {}] ",
            meta.level(),
            meta.file().unwrap_or("??"),
            meta.line().unwrap_or(0),
            meta.module_path().unwrap_or("???"),
        )?;

        // key-value pairs for this event (usually just the message)
        ctx.field_format().format_fields(w.by_ref(), ev)?;
        writeln!(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn formatter_prefixes_sequence_level_and_location() {
        let buffer = Buffer::default();
        let sink = buffer.clone();

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .event_format(SeqFileMod)
                .with_writer(move || sink.clone())
                .with_ansi(false),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(folder_id = "f1", "listing failed");
        });

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let line = output.lines().next().unwrap();

        assert!(line.chars().take(6).all(|c| c.is_ascii_digit()));
        assert!(line.contains(" WARN  [") || line.contains(" WARN ["));
        assert!(line.contains("logging.rs:"));
        assert!(line.contains("listing failed"));
        assert!(line.contains("folder_id=\"f1\""));
    }
}
