// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Console interception for non-browser runtimes.
//!
//! In a server-side process the "console" is the global `log` facade.
//! [`ConsoleInterceptor::install`] registers a `log::Log` implementation that
//! forwards every record to a [`Logger`], so `log::info!` calls from the
//! application and its dependencies come out as structured records.
//!
//! Call arguments become `(message, context)` with a fixed rule, see
//! [`parse_console_args`]. Hosts bridging variadic console calls (a script
//! engine, an FFI layer) can use [`ConsoleInterceptor::dispatch`] directly.
//!
//! The global logger can only be set once per process; a second install
//! returns [`InstallError::Logger`].

use std::sync::Arc;

use log::kv::{self, VisitSource};
use serde_json::{Map, Value};

use crate::config::log_level::LogLevel;
use crate::error::InstallError;
use crate::facade::Logger;

/// Context key holding every argument after the first.
pub const ARGS_FIELD: &str = "args";

/// Splits console call arguments into a message and a context.
///
/// The first argument is the message: used as-is when it is a string,
/// serialized to JSON text otherwise. Remaining arguments are folded, in
/// order, into the `args` context field.
///
/// ```
/// use datadog_client_logs::intercept::parse_console_args;
/// use serde_json::json;
///
/// let (message, context) = parse_console_args(&[json!("saved"), json!({"id": 7}), json!(true)]);
/// assert_eq!(message, "saved");
/// assert_eq!(context.unwrap()["args"], json!([{"id": 7}, true]));
/// ```
#[must_use]
pub fn parse_console_args(args: &[Value]) -> (String, Option<Map<String, Value>>) {
    let Some((first, rest)) = args.split_first() else {
        return (String::new(), None);
    };
    let message = match first {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    if rest.is_empty() {
        return (message, None);
    }
    let mut context = Map::new();
    context.insert(ARGS_FIELD.to_string(), Value::Array(rest.to_vec()));
    (message, Some(context))
}

/// `log::Log` adapter forwarding records to a [`Logger`].
#[derive(Debug)]
pub struct ConsoleInterceptor {
    logger: Arc<Logger>,
}

impl ConsoleInterceptor {
    #[must_use]
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    /// Installs the interceptor as the process-wide `log` logger.
    ///
    /// Refused in browser-like runtimes, where correlation and delivery are
    /// already handled by the logger itself.
    pub fn install(logger: Arc<Logger>) -> Result<(), InstallError> {
        if logger.is_runtime_browser() {
            return Err(InstallError::BrowserRuntime);
        }
        log::set_boxed_logger(Box::new(Self::new(logger)))?;
        // Filtering happens in `enabled` so later `set_level` calls apply.
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }

    /// Forwards one console call.
    pub fn dispatch(&self, level: LogLevel, args: &[Value]) {
        let (message, context) = parse_console_args(args);
        self.logger.log(level, &message, context);
    }
}

impl log::Log for ConsoleInterceptor {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger
            .enabled(LogLevel::from_log_level(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut args = vec![Value::String(record.args().to_string())];

        let mut fields = FieldCollector::default();
        if record.key_values().visit(&mut fields).is_ok() && !fields.0.is_empty() {
            args.push(Value::Object(fields.0));
        }

        self.dispatch(LogLevel::from_log_level(record.level()), &args);
    }

    fn flush(&self) {
        self.logger.flush();
    }
}

#[derive(Default)]
struct FieldCollector(Map<String, Value>);

impl<'kvs> VisitSource<'kvs> for FieldCollector {
    fn visit_pair(&mut self, key: kv::Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        self.0.insert(key.as_str().to_string(), to_json(&value));
        Ok(())
    }
}

fn to_json(value: &kv::Value<'_>) -> Value {
    if let Some(flag) = value.to_bool() {
        return Value::Bool(flag);
    }
    if let Some(number) = value.to_i64() {
        return Value::from(number);
    }
    if let Some(number) = value.to_u64() {
        return Value::from(number);
    }
    if let Some(number) = value.to_f64() {
        return Value::from(number);
    }
    if let Some(text) = value.to_borrowed_str() {
        return Value::from(text);
    }
    Value::String(value.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::runtime::PageRuntime;
    use crate::sink::MemorySink;
    use log::Log;
    use serde_json::json;

    fn interceptor() -> (ConsoleInterceptor, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::builder(Config::default()).sink(sink.clone()).build();
        (ConsoleInterceptor::new(Arc::new(logger)), sink)
    }

    #[test]
    fn test_parse_empty_args() {
        assert_eq!(parse_console_args(&[]), (String::new(), None));
    }

    #[test]
    fn test_parse_text_message_only() {
        assert_eq!(
            parse_console_args(&[json!("hello")]),
            ("hello".to_string(), None)
        );
    }

    #[test]
    fn test_parse_non_text_message_is_serialized() {
        let (message, context) = parse_console_args(&[json!({"code": 500})]);
        assert_eq!(message, r#"{"code":500}"#);
        assert!(context.is_none());

        let (message, _) = parse_console_args(&[json!(42)]);
        assert_eq!(message, "42");
    }

    #[test]
    fn test_parse_rest_folded_into_args() {
        let (message, context) =
            parse_console_args(&[json!("request failed"), json!(503), json!("retrying")]);
        assert_eq!(message, "request failed");
        assert_eq!(context.unwrap(), json!({"args": [503, "retrying"]}).as_object().cloned().unwrap());
    }

    #[test]
    fn test_dispatch_reaches_logger() {
        let (interceptor, sink) = interceptor();
        interceptor.dispatch(LogLevel::Warn, &[json!("low disk"), json!({"free": "1GB"})]);

        let record = &sink.records()[0];
        assert_eq!(record["level"], "warn");
        assert_eq!(record["message"], "low disk");
        assert_eq!(record["context"]["args"][0]["free"], "1GB");
    }

    #[test]
    fn test_log_record_with_key_values() {
        let (interceptor, sink) = interceptor();
        let kvs: &[(&str, i64)] = &[("userId", 42)];
        interceptor.log(
            &log::Record::builder()
                .args(format_args!("user login"))
                .level(log::Level::Info)
                .key_values(&kvs)
                .build(),
        );

        let record = &sink.records()[0];
        assert_eq!(record["level"], "info");
        assert_eq!(record["message"], "user login");
        assert_eq!(record["context"]["args"][0]["userId"], 42);
    }

    #[test]
    fn test_log_record_respects_level() {
        let (interceptor, sink) = interceptor();
        interceptor.log(
            &log::Record::builder()
                .args(format_args!("noise"))
                .level(log::Level::Trace)
                .build(),
        );
        assert!(sink.is_empty());

        interceptor.logger.set_level(LogLevel::Debug);
        interceptor.log(
            &log::Record::builder()
                .args(format_args!("trace as debug"))
                .level(log::Level::Trace)
                .build(),
        );
        assert_eq!(sink.levels(), vec![LogLevel::Debug]);
        assert!(sink.records()[0].get("context").is_some());
        assert!(sink.records()[0]["context"].get("args").is_none());
    }

    #[test]
    fn test_enabled_follows_logger_level() {
        let (interceptor, _) = interceptor();
        let warn = log::Metadata::builder().level(log::Level::Warn).build();
        let debug = log::Metadata::builder().level(log::Level::Debug).build();
        assert!(interceptor.enabled(&warn));
        assert!(!interceptor.enabled(&debug));
    }

    #[test]
    fn test_install_refused_in_browser_runtime() {
        let logger = Logger::builder(Config::default())
            .runtime(Arc::new(PageRuntime::default()))
            .sink(Arc::new(MemorySink::new()))
            .build();
        assert!(matches!(
            ConsoleInterceptor::install(Arc::new(logger)),
            Err(InstallError::BrowserRuntime)
        ));
    }
}
