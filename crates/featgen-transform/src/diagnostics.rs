//! Diagnostics sinks for generator messages.
//!
//! Generators never log through a process-wide handle. Each one receives an
//! `Arc<dyn DiagnosticsSink>` at construction, so the orchestrator decides
//! where operator-facing messages go for the lifetime of a pipeline run.
//!
//! - [`TracingSink`] forwards to `tracing` under the `featgen` target.
//! - [`MemorySink`] keeps every message in memory for later inspection.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::Level;

/// Leveled message consumer.
pub trait DiagnosticsSink: Send + Sync {
    /// Records one message at `level`.
    fn log(&self, level: Level, message: &str);
}

/// Forwards messages to the global `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::TRACE => tracing::trace!(target: "featgen", "{message}"),
            Level::DEBUG => tracing::debug!(target: "featgen", "{message}"),
            Level::INFO => tracing::info!(target: "featgen", "{message}"),
            Level::WARN => tracing::warn!(target: "featgen", "{message}"),
            _ => tracing::error!(target: "featgen", "{message}"),
        }
    }
}

/// Shared handle to a [`TracingSink`].
pub fn tracing_sink() -> Arc<dyn DiagnosticsSink> {
    Arc::new(TracingSink)
}

/// A message captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

/// Sink that records every message.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Recorded entries at exactly `level`.
    pub fn at_level(&self, level: Level) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|entry| entry.level == level)
            .cloned()
            .collect()
    }

    pub fn warnings(&self) -> Vec<LogEntry> {
        self.at_level(Level::WARN)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticsSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        self.lock().push(LogEntry {
            level,
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_filters_by_level() {
        let sink = MemorySink::new();
        sink.log(Level::INFO, "fitted");
        sink.log(Level::WARN, "nulls found");
        sink.log(Level::WARN, "again");

        assert_eq!(sink.entries().len(), 3);
        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].message, "nulls found");

        sink.clear();
        assert!(sink.entries().is_empty());
    }
}
