// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::config::log_level::LogLevel;

/// One log call, captured for delivery.
///
/// Immutable once created: the queue owns it until it is moved into a
/// [`Batch`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    level: LogLevel,
    message: String,
    context: Map<String, Value>,
    captured_at: DateTime<Utc>,
}

/// Ordered snapshot of events taken from a queue in a single drain.
pub type Batch = Vec<LogEvent>;

impl LogEvent {
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>, context: Map<String, Value>) -> Self {
        Self::captured(level, message, context, Utc::now())
    }

    /// Creates an event with an explicit capture time.
    #[must_use]
    pub fn captured(
        level: LogLevel,
        message: impl Into<String>,
        context: Map<String, Value>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            context,
            captured_at,
        }
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Capture time as ISO-8601 with millisecond precision, e.g.
    /// `2025-03-01T12:00:00.250Z`.
    #[must_use]
    pub fn timestamp(&self) -> String {
        format_timestamp(self.captured_at)
    }
}

pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
