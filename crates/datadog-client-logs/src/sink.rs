// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Local console sinks.
//!
//! The logger hands every accepted call to a [`ConsoleSink`] as one
//! already-rendered JSON line. Sinks must not fail the caller: write errors
//! are ignored.

use std::io::Write;
use std::sync::Mutex;

use serde_json::Value;

use crate::config::log_level::LogLevel;
use crate::lock;

pub trait ConsoleSink: Send + Sync {
    /// Writes one record. `line` carries no trailing newline.
    fn write(&self, level: LogLevel, line: &str);
}

/// Writes `warn` and `error` records to stderr and everything else to stdout,
/// the way a console splits them.
#[derive(Debug, Default, Copy, Clone)]
pub struct StdioSink;

impl ConsoleSink for StdioSink {
    fn write(&self, level: LogLevel, line: &str) {
        let _ = match level {
            LogLevel::Warn | LogLevel::Error => writeln!(std::io::stderr().lock(), "{line}"),
            LogLevel::Debug | LogLevel::Info => writeln!(std::io::stdout().lock(), "{line}"),
        };
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines)
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Captured lines parsed as JSON. Lines that are not valid JSON become
    /// `Value::Null`.
    #[must_use]
    pub fn records(&self) -> Vec<Value> {
        lock(&self.lines)
            .iter()
            .map(|(_, line)| serde_json::from_str(line).unwrap_or(Value::Null))
            .collect()
    }

    #[must_use]
    pub fn levels(&self) -> Vec<LogLevel> {
        lock(&self.lines).iter().map(|(level, _)| *level).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.lines).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.lines).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.lines).clear();
    }
}

impl ConsoleSink for MemorySink {
    fn write(&self, level: LogLevel, line: &str) {
        lock(&self.lines).push((level, line.to_string()));
    }
}
