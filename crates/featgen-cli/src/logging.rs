//! Logging infrastructure using `tracing` and `tracing-subscriber`.
//!
//! The library crates emit spans around fit/transform and route stage
//! diagnostics (null repairs, ignored removals, dtype dumps) through a sink
//! that forwards to `tracing` under the `featgen` target. This module
//! installs the subscriber that renders all of it.
//!
//! # Log Levels
//!
//! - `error`: fatal errors
//! - `warn`: null repairs and other recoverable divergences
//! - `info`: command progress, dtype dumps
//! - `debug`: scope inference and ignored feature removals
//! - `trace`: span enter/exit detail
//!
//! # Usage
//!
//! ```ignore
//! use featgen_cli::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_verbosity(1);
//! init_logging(&config)?;
//! ```

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, MakeWriter, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Crates whose events follow the configured level. Everything else stays
/// at warn.
const FEATGEN_TARGETS: [&str; 5] = [
    "featgen",
    "featgen_cli",
    "featgen_common",
    "featgen_model",
    "featgen_transform",
];

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Maximum level for featgen crates.
    pub level_filter: LevelFilter,
    /// Whether `RUST_LOG` may override `level_filter`.
    pub use_env_filter: bool,
    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
    /// Whether to include target (module path) in log output.
    pub with_target: bool,
    /// Whether to include span close events in JSON output.
    pub with_spans: bool,
    /// Whether to use ANSI colors in output.
    pub with_ansi: bool,
    /// Output format.
    pub format: LogFormat,
    /// Optional log file path. When set, logs are written to the file.
    pub log_file: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON format for machine parsing.
    Json,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::WARN,
            use_env_filter: true,
            with_timestamps: false,
            with_target: false,
            with_spans: true,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

impl LogConfig {
    /// Create a `LogConfig` from a `-v` count.
    ///
    /// - 0: warn
    /// - 1 (`-v`): info
    /// - 2 (`-vv`): debug
    /// - 3+ (`-vvv`): trace
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level_filter = match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };
        Self {
            level_filter,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_level_filter(mut self, level_filter: LevelFilter) -> Self {
        self.level_filter = level_filter;
        self
    }

    /// Let `RUST_LOG` take precedence over the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, enable: bool) -> Self {
        self.use_env_filter = enable;
        self
    }

    #[must_use]
    pub fn with_timestamps(mut self, enable: bool) -> Self {
        self.with_timestamps = enable;
        self
    }

    #[must_use]
    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log file path (writes to stderr when None).
    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }
}

/// Initialize the global tracing subscriber with the given configuration.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    if let Some(path) = &config.log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        init_logging_with_writer(config, SharedFileWriter::new(file));
    } else {
        init_logging_with_writer(config, io::stderr);
    }
    Ok(())
}

/// Initialize logging with a custom writer.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let span_events = if config.with_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let layer = match (config.format, config.with_timestamps) {
        (LogFormat::Json, _) => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(config.with_target)
            .with_span_events(span_events)
            .boxed(),
        (LogFormat::Compact, true) => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .boxed(),
        (LogFormat::Compact, false) => fmt::layer()
            .compact()
            .without_time()
            .with_writer(writer)
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .boxed(),
        (LogFormat::Pretty, true) => fmt::layer()
            .with_writer(writer)
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .boxed(),
        (LogFormat::Pretty, false) => fmt::layer()
            .without_time()
            .with_writer(writer)
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(build_env_filter(config))
        .init();
}

#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl SharedFileWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

struct SharedFileGuard {
    file: Arc<Mutex<std::fs::File>>,
}

impl Write for SharedFileGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileGuard {
            file: Arc::clone(&self.file),
        }
    }
}

/// Default directives: warn for dependencies, the configured level for
/// featgen crates.
fn default_directives(level_filter: LevelFilter) -> String {
    let level = level_filter.to_string().to_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        FEATGEN_TARGETS
            .iter()
            .map(|target| format!("{target}={level}")),
    );
    directives.join(",")
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let fallback = || EnvFilter::new(default_directives(config.level_filter));
    if config.use_env_filter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
    } else {
        fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_verbosity() {
        assert_eq!(LogConfig::from_verbosity(0).level_filter, LevelFilter::WARN);
        assert_eq!(LogConfig::from_verbosity(2).level_filter, LevelFilter::DEBUG);
        assert_eq!(LogConfig::from_verbosity(9).level_filter, LevelFilter::TRACE);
    }

    #[test]
    fn test_default_directives() {
        insta::assert_snapshot!(default_directives(LevelFilter::INFO), @"warn,featgen=info,featgen_cli=info,featgen_common=info,featgen_model=info,featgen_transform=info");
    }
}
