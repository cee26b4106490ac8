// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Configuration Module
//!
//! Configuration is read once at process/module start and is immutable
//! thereafter, except for the log level which the [`Logger`](crate::Logger)
//! can change at runtime.
//!
//! ## Configuration Priority
//!
//! Sources are applied in the following order (later sources override earlier):
//!
//! 1. **Defaults** - Hard-coded defaults in the code
//! 2. **Environment variables** - see [`env::EnvConfigSource`]
//!
//! ## Edge Cases and Behaviors
//!
//! - **Endpoint**: trimmed; empty after trimming means "no delivery endpoint"
//! - **Service**: trimmed; empty after trimming keeps the default
//! - **Batch capacity = 0**: falls back to the default (10)
//! - **Flush interval = 0**: falls back to the default (5000 ms)
//! - **Flush timeout = 0**: falls back to the default (5 seconds)

pub mod env;
pub mod log_level;
pub mod runtime_mode;

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::{env::EnvConfigSource, log_level::LogLevel, runtime_mode::RuntimeMode};
use crate::logs::constants;

#[derive(Debug, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub enum ConfigError {
    ParseError(String),
}

#[allow(clippy::module_name_repetitions)]
pub trait ConfigSource {
    fn load(&self, config: &mut Config) -> Result<(), ConfigError>;
}

#[derive(Default)]
#[allow(clippy::module_name_repetitions)]
pub struct ConfigBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
    config: Config,
}

#[allow(clippy::module_name_repetitions)]
impl ConfigBuilder {
    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn build(&mut self) -> Config {
        let mut failed_sources = 0;
        for source in &self.sources {
            match source.load(&mut self.config) {
                Ok(()) => (),
                Err(e) => {
                    error!("CONFIG | Failed to load config: {:?}", e);
                    failed_sources += 1;
                }
            }
        }

        if !self.sources.is_empty() && failed_sources == self.sources.len() {
            debug!("CONFIG | All sources failed to load config, using default config.");
        }

        self.config.endpoint = self
            .config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .map(str::to_string);

        let service = self.config.service.trim();
        if service.is_empty() {
            self.config.service = DEFAULT_SERVICE.to_string();
        } else {
            self.config.service = service.to_string();
        }

        if self.config.batch_capacity == 0 {
            self.config.batch_capacity = constants::DEFAULT_BATCH_CAPACITY;
        }
        if self.config.flush_interval.is_zero() {
            self.config.flush_interval = constants::DEFAULT_FLUSH_INTERVAL;
        }
        if self.config.flush_timeout.is_zero() {
            self.config.flush_timeout = constants::DEFAULT_FLUSH_TIMEOUT;
        }

        self.config.clone()
    }
}

/// Service name used when none is configured.
pub const DEFAULT_SERVICE: &str = "web-client";

/// Field names used when enriching a log call's context.
///
/// Caller-supplied context keys win over every schema key except
/// [`LogSchema::correlation`], which is always forced to the resolved id.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LogSchema {
    pub level: String,
    pub message: String,
    pub timestamp: String,
    pub service: String,
    pub correlation: String,
}

impl Default for LogSchema {
    fn default() -> Self {
        Self {
            level: "level".to_string(),
            message: "message".to_string(),
            timestamp: "timestamp".to_string(),
            service: "service".to_string(),
            correlation: "correlation_id".to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct Config {
    pub level: LogLevel,
    pub runtime_mode: RuntimeMode,

    // Delivery
    pub endpoint: Option<String>,
    pub service: String,
    pub batch_capacity: usize,
    pub flush_interval: Duration,

    // Timeout for a single network delivery attempt
    pub flush_timeout: Duration,

    pub schema: LogSchema,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            runtime_mode: RuntimeMode::default(),
            endpoint: None,
            service: DEFAULT_SERVICE.to_string(),
            batch_capacity: constants::DEFAULT_BATCH_CAPACITY,
            flush_interval: constants::DEFAULT_FLUSH_INTERVAL,
            flush_timeout: constants::DEFAULT_FLUSH_TIMEOUT,
            schema: LogSchema::default(),
        }
    }
}

impl Config {
    /// Returns true if events should be queued for delivery.
    #[must_use]
    pub fn has_endpoint(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// Builds the process configuration from defaults and the environment.
#[must_use]
pub fn get_config() -> Config {
    ConfigBuilder::default()
        .add_source(Box::new(EnvConfigSource))
        .build()
}

/// Deserializes an optional value without failing the whole source.
///
/// Values that cannot be converted into `T` are logged and treated as absent.
pub fn deserialize_option_lossless<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    // Environment values may arrive as strings even when numeric
    let candidate = match &value {
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_or_else(|_| value.clone(), Value::from),
        _ => value.clone(),
    };
    match serde_json::from_value::<T>(candidate) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            error!("CONFIG | Ignoring invalid config value {:?}: {}", value, e);
            Ok(None)
        }
    }
}

/// Deserializes an optional string, treating blank values as absent.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        Value::Null => Ok(None),
        other => Ok(Some(other.to_string())),
    }
}
