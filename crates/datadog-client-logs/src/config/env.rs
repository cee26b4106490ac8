// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Environment variable configuration source.
//!
//! Variables are read once, through figment's `Env` provider, when the
//! configuration is built:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DD_LOG_LEVEL` | `level` (takes precedence) |
//! | `LOG_LEVEL` | `level` (fallback convention) |
//! | `DD_RUNTIME_MODE` | `runtime_mode` |
//! | `DD_CLIENT_LOGS_ENDPOINT` | `endpoint` |
//! | `DD_SERVICE` | `service` |
//! | `DD_CLIENT_LOGS_BATCH_SIZE` | `batch_capacity` |
//! | `DD_CLIENT_LOGS_FLUSH_INTERVAL_MS` | `flush_interval` |
//! | `DD_CLIENT_LOGS_FLUSH_TIMEOUT` | `flush_timeout` (seconds) |
//!
//! Invalid values are logged and ignored.

use std::str::FromStr;
use std::time::Duration;

use figment::{providers::Env, Figment};
use serde::Deserialize;
use tracing::error;

use crate::config::{
    deserialize_option_lossless, deserialize_optional_string, log_level::LogLevel,
    runtime_mode::RuntimeMode, Config, ConfigError, ConfigSource,
};

const ENV_KEYS: [&str; 8] = [
    "dd_log_level",
    "log_level",
    "dd_runtime_mode",
    "dd_client_logs_endpoint",
    "dd_service",
    "dd_client_logs_batch_size",
    "dd_client_logs_flush_interval_ms",
    "dd_client_logs_flush_timeout",
];

#[derive(Debug, PartialEq, Deserialize, Clone, Default)]
#[serde(default)]
#[allow(clippy::module_name_repetitions)]
pub struct EnvConfig {
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub dd_log_level: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub log_level: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub dd_runtime_mode: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub dd_client_logs_endpoint: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub dd_service: Option<String>,
    #[serde(deserialize_with = "deserialize_option_lossless")]
    pub dd_client_logs_batch_size: Option<usize>,
    #[serde(deserialize_with = "deserialize_option_lossless")]
    pub dd_client_logs_flush_interval_ms: Option<u64>,
    #[serde(deserialize_with = "deserialize_option_lossless")]
    pub dd_client_logs_flush_timeout: Option<u64>,
}

impl EnvConfig {
    /// Resolves the level override: the first variable holding a valid level wins.
    fn level(&self) -> Option<LogLevel> {
        [&self.dd_log_level, &self.log_level]
            .into_iter()
            .flatten()
            .find_map(|raw| match LogLevel::from_str(raw) {
                Ok(level) => Some(level),
                Err(e) => {
                    error!("CONFIG | {}", e);
                    None
                }
            })
    }
}

/// Loads configuration overrides from the process environment.
#[allow(clippy::module_name_repetitions)]
pub struct EnvConfigSource;

impl ConfigSource for EnvConfigSource {
    fn load(&self, config: &mut Config) -> Result<(), ConfigError> {
        let figment = Figment::new().merge(Env::raw().only(&ENV_KEYS));

        let env_config: EnvConfig = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(level) = env_config.level() {
            config.level = level;
        }

        if let Some(raw) = &env_config.dd_runtime_mode {
            match RuntimeMode::from_env_str(raw) {
                Some(mode) => config.runtime_mode = mode,
                None => error!(
                    "CONFIG | Invalid runtime mode '{}', using {}",
                    raw, config.runtime_mode
                ),
            }
        }

        if env_config.dd_client_logs_endpoint.is_some() {
            config
                .endpoint
                .clone_from(&env_config.dd_client_logs_endpoint);
        }
        if let Some(service) = &env_config.dd_service {
            config.service.clone_from(service);
        }
        if let Some(capacity) = env_config.dd_client_logs_batch_size {
            config.batch_capacity = capacity;
        }
        if let Some(interval) = env_config.dd_client_logs_flush_interval_ms {
            config.flush_interval = Duration::from_millis(interval);
        }
        if let Some(timeout) = env_config.dd_client_logs_flush_timeout {
            config.flush_timeout = Duration::from_secs(timeout);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{get_config, DEFAULT_SERVICE};

    #[test]
    fn test_parse_default() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let config = get_config();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_parse_dd_log_level() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DD_LOG_LEVEL", "DEBUG");
            let config = get_config();
            assert_eq!(config.level, LogLevel::Debug);
            Ok(())
        });
    }

    #[test]
    fn test_parse_fallback_log_level() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("LOG_LEVEL", "error");
            let config = get_config();
            assert_eq!(config.level, LogLevel::Error);
            Ok(())
        });
    }

    #[test]
    fn test_dd_log_level_takes_precedence() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DD_LOG_LEVEL", "warn");
            jail.set_env("LOG_LEVEL", "debug");
            let config = get_config();
            assert_eq!(config.level, LogLevel::Warn);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_first_level_falls_through() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DD_LOG_LEVEL", "loud");
            jail.set_env("LOG_LEVEL", "debug");
            let config = get_config();
            assert_eq!(config.level, LogLevel::Debug);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_level_keeps_default() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DD_LOG_LEVEL", "loud");
            let config = get_config();
            assert_eq!(config.level, LogLevel::Info);
            Ok(())
        });
    }

    #[test]
    fn test_parse_runtime_mode() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DD_RUNTIME_MODE", "development");
            let config = get_config();
            assert_eq!(config.runtime_mode, RuntimeMode::Development);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_runtime_mode_keeps_production() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DD_RUNTIME_MODE", "staging");
            let config = get_config();
            assert_eq!(config.runtime_mode, RuntimeMode::Production);
            Ok(())
        });
    }

    #[test]
    fn test_parse_endpoint_and_service() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DD_CLIENT_LOGS_ENDPOINT", " https://logs.example.com/v1/input ");
            jail.set_env("DD_SERVICE", "checkout");
            let config = get_config();
            assert_eq!(
                config.endpoint.as_deref(),
                Some("https://logs.example.com/v1/input")
            );
            assert_eq!(config.service, "checkout");
            Ok(())
        });
    }

    #[test]
    fn test_blank_service_keeps_default() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DD_SERVICE", "   ");
            let config = get_config();
            assert_eq!(config.service, DEFAULT_SERVICE);
            Ok(())
        });
    }

    #[test]
    fn test_parse_batching_values() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DD_CLIENT_LOGS_BATCH_SIZE", "25");
            jail.set_env("DD_CLIENT_LOGS_FLUSH_INTERVAL_MS", "1500");
            jail.set_env("DD_CLIENT_LOGS_FLUSH_TIMEOUT", "2");
            let config = get_config();
            assert_eq!(config.batch_capacity, 25);
            assert_eq!(config.flush_interval, Duration::from_millis(1500));
            assert_eq!(config.flush_timeout, Duration::from_secs(2));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_batching_values_are_ignored() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DD_CLIENT_LOGS_BATCH_SIZE", "many");
            jail.set_env("DD_CLIENT_LOGS_FLUSH_INTERVAL_MS", "0");
            let config = get_config();
            assert_eq!(config.batch_capacity, 10);
            assert_eq!(config.flush_interval, Duration::from_millis(5000));
            Ok(())
        });
    }
}
