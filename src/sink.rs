//! Log sink: where registry diagnostics go
//!
//! The registry reports user-facing notices (no listeners, missing event
//! catalog, caught async handler failures, history dumps) through a
//! `LogSink`. `TracingSink` forwards to `tracing`; `MemoryLogSink` keeps
//! records in memory so tests can assert on them.

use std::sync::RwLock;

/// Severity of a sink record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// A single diagnostic emitted by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

/// Trait for registry diagnostic sinks
pub trait LogSink: Send + Sync {
    /// Informational notice
    fn info(&self, message: &str);

    /// Error notice
    fn error(&self, message: &str);
}

/// Sink that forwards to the `tracing` ecosystem (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!(target: "a3s_pubsub", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "a3s_pubsub", "{}", message);
    }
}

/// In-memory sink for testing
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    records: RwLock<Vec<LogRecord>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in emission order
    pub fn records(&self) -> Vec<LogRecord> {
        self.read().clone()
    }

    /// Messages emitted at `level`, in order
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.read()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.messages(LogLevel::Info)
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(LogLevel::Error)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.write().push(LogRecord {
            level,
            message: message.to_string(),
        });
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<LogRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<LogRecord>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl LogSink for MemoryLogSink {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
