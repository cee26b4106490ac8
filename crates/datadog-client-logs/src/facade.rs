// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Public structured logging API.
//!
//! Every call to [`Logger::debug`], [`Logger::info`], [`Logger::warn`] or
//! [`Logger::error`]:
//!
//! 1. is dropped if below the current level
//! 2. resolves the correlation id
//! 3. builds the enriched context: schema fields, then caller keys (caller
//!    wins), then the correlation field (always forced when resolved)
//! 4. writes one JSON record to the console sink
//! 5. in a browser-like runtime with an endpoint configured, enqueues the
//!    enriched event on that endpoint's pipeline
//!
//! Nothing escapes a log call: failures in steps 4 and 5 are reported on the
//! diagnostics channel and the whole call runs under `catch_unwind`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use datadog_client_logs::{Config, Logger};
//! use datadog_client_logs::sink::MemorySink;
//! use serde_json::json;
//!
//! let sink = Arc::new(MemorySink::new());
//! let logger = Logger::builder(Config::default()).sink(sink.clone()).build();
//!
//! let context = json!({"userId": 42}).as_object().cloned();
//! logger.info("user login", context);
//!
//! let record = &sink.records()[0];
//! assert_eq!(record["level"], "info");
//! assert_eq!(record["context"]["userId"], 42);
//! ```

use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::clock::{current_or_background, Scheduler, TokioScheduler};
use crate::config::{
    self, log_level::LogLevel, runtime_mode::RuntimeMode, Config, LogSchema,
};
use crate::correlation::CorrelationIdProvider;
use crate::event_bus::EventSender;
use crate::http::get_client;
use crate::logs::event::{format_timestamp, LogEvent};
use crate::logs::registry::{PipelineRegistry, TransportFactory};
use crate::logs::transport::{HttpTransport, Transport};
use crate::runtime::{RuntimeEnvironment, ServerRuntime};
use crate::sink::{ConsoleSink, StdioSink};

/// Assembles a [`Logger`] from a configuration and injected capabilities.
///
/// Anything not injected gets the production default: a [`ServerRuntime`],
/// a [`StdioSink`], a [`TokioScheduler`] and HTTP transports.
pub struct LoggerBuilder {
    config: Config,
    runtime: Option<Arc<dyn RuntimeEnvironment>>,
    sink: Option<Arc<dyn ConsoleSink>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    transport_factory: Option<TransportFactory>,
    events: Option<EventSender>,
    handle: Option<Handle>,
}

impl LoggerBuilder {
    #[must_use]
    pub fn runtime(mut self, runtime: Arc<dyn RuntimeEnvironment>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn ConsoleSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Replaces the HTTP transport with a custom one per endpoint.
    #[must_use]
    pub fn transport_factory(mut self, factory: TransportFactory) -> Self {
        self.transport_factory = Some(factory);
        self
    }

    /// Publishes delivery outcomes.
    ///
    /// Every queue reports batches lost to a panicking transport. Success and
    /// failure of the delivery itself are published by the default HTTP
    /// transports only; a custom [`transport_factory`](Self::transport_factory)
    /// reports its own outcomes.
    #[must_use]
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Tokio runtime used for timers and network deliveries. Defaults to the
    /// runtime of the context calling [`build`](Self::build), then to the
    /// crate's background runtime.
    #[must_use]
    pub fn handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    #[must_use]
    pub fn build(self) -> Logger {
        let config = self.config;
        let runtime: Arc<dyn RuntimeEnvironment> =
            self.runtime.unwrap_or_else(|| Arc::new(ServerRuntime));
        if runtime.is_browser() && !config.has_endpoint() {
            report(
                config.runtime_mode,
                "No delivery endpoint configured",
                &"logs stay on the console",
            );
        }
        let needs_runtime = self.scheduler.is_none() || self.transport_factory.is_none();
        let handle = match self.handle {
            Some(handle) => Some(handle),
            None if !needs_runtime => None,
            None => {
                if Handle::try_current().is_err() && runtime.is_browser() {
                    report(
                        config.runtime_mode,
                        "No tokio runtime in scope",
                        &"flush timers and deliveries use the background runtime",
                    );
                }
                current_or_background()
            }
        };
        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => match &handle {
                Some(handle) => Arc::new(TokioScheduler::new(handle.clone())),
                None => Arc::new(TokioScheduler::current()),
            },
        };
        let events = self.events;
        let transport_factory = self.transport_factory.unwrap_or_else(|| {
            http_transport_factory(&config, Arc::clone(&runtime), events.clone(), handle)
        });
        let correlation = Arc::new(CorrelationIdProvider::new(Arc::clone(&runtime)));
        let registry = PipelineRegistry::new(
            transport_factory,
            scheduler,
            Arc::clone(&runtime),
            Arc::clone(&correlation),
            config.batch_capacity,
            config.flush_interval,
            events,
        );

        Logger {
            level: AtomicU8::new(config.level.as_u8()),
            runtime_mode: config.runtime_mode,
            endpoint: config.endpoint,
            service: config.service,
            schema: config.schema,
            runtime,
            correlation,
            sink: self.sink.unwrap_or_else(|| Arc::new(StdioSink)),
            registry,
        }
    }
}

fn http_transport_factory(
    config: &Config,
    runtime: Arc<dyn RuntimeEnvironment>,
    events: Option<EventSender>,
    handle: Option<Handle>,
) -> TransportFactory {
    let client = get_client(config);
    let config = config.clone();
    Arc::new(move |endpoint: &str| {
        let mut transport =
            HttpTransport::new(endpoint, client.clone(), Arc::clone(&runtime), &config);
        if let Some(handle) = &handle {
            transport = transport.with_handle(handle.clone());
        }
        if let Some(events) = &events {
            transport = transport.with_events(events.clone());
        }
        Arc::new(transport) as Arc<dyn Transport>
    })
}

/// Structured logger owning its delivery pipelines.
pub struct Logger {
    level: AtomicU8,
    runtime_mode: RuntimeMode,
    endpoint: Option<String>,
    service: String,
    schema: LogSchema,
    runtime: Arc<dyn RuntimeEnvironment>,
    correlation: Arc<CorrelationIdProvider>,
    sink: Arc<dyn ConsoleSink>,
    registry: PipelineRegistry,
}

impl Logger {
    #[must_use]
    pub fn builder(config: Config) -> LoggerBuilder {
        LoggerBuilder {
            config,
            runtime: None,
            sink: None,
            scheduler: None,
            transport_factory: None,
            events: None,
            handle: None,
        }
    }

    /// Logger with production defaults for a non-browser process.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::builder(config).build()
    }

    /// Logger configured from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(config::get_config())
    }

    pub fn debug(&self, message: &str, context: Option<Map<String, Value>>) {
        self.log(LogLevel::Debug, message, context);
    }

    pub fn info(&self, message: &str, context: Option<Map<String, Value>>) {
        self.log(LogLevel::Info, message, context);
    }

    pub fn warn(&self, message: &str, context: Option<Map<String, Value>>) {
        self.log(LogLevel::Warn, message, context);
    }

    pub fn error(&self, message: &str, context: Option<Map<String, Value>>) {
        self.log(LogLevel::Error, message, context);
    }

    /// Logs at `level`. Never panics and never returns an error.
    pub fn log(&self, level: LogLevel, message: &str, context: Option<Map<String, Value>>) {
        if !self.enabled(level) {
            return;
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.emit(level, message, context)));
        if outcome.is_err() {
            self.report_failure("Log call panicked", &message);
        }
    }

    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.get_level()
    }

    /// Changes the level for subsequent calls. Already-queued events are kept.
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    #[must_use]
    pub fn get_level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Force-flushes every pipeline.
    pub fn flush(&self) {
        self.registry.flush_all();
    }

    /// Cancels timers, discards buffered events and drops every pipeline.
    /// The logger stays usable; pipelines are rebuilt on demand.
    pub fn dispose(&self) {
        self.registry.dispose();
    }

    /// Number of constructed queue + transport pairs.
    #[must_use]
    pub fn pipeline_count(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_runtime_browser(&self) -> bool {
        self.runtime.is_browser()
    }

    #[must_use]
    pub fn runtime_mode(&self) -> RuntimeMode {
        self.runtime_mode
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// The correlation id the next log call would carry.
    #[must_use]
    pub fn correlation_id(&self) -> Option<String> {
        self.correlation.resolve()
    }

    fn emit(&self, level: LogLevel, message: &str, context: Option<Map<String, Value>>) {
        let captured_at = Utc::now();
        let correlation_id = self.correlation.resolve();
        let enriched = self.enrich(
            level,
            message,
            captured_at,
            context,
            correlation_id.as_deref(),
        );

        match render(level, message, captured_at, &enriched) {
            Ok(line) => self.sink.write(level, &line),
            Err(e) => self.report_failure("Failed to render console record", &e),
        }

        if !self.runtime.is_browser() {
            return;
        }
        if let Some(endpoint) = &self.endpoint {
            self.registry
                .queue_for(endpoint)
                .add(LogEvent::captured(level, message, enriched, captured_at));
        }
    }

    fn enrich(
        &self,
        level: LogLevel,
        message: &str,
        captured_at: DateTime<Utc>,
        context: Option<Map<String, Value>>,
        correlation_id: Option<&str>,
    ) -> Map<String, Value> {
        let mut enriched = Map::new();
        enriched.insert(self.schema.level.clone(), Value::from(level.as_ref()));
        enriched.insert(self.schema.message.clone(), Value::from(message));
        enriched.insert(
            self.schema.timestamp.clone(),
            Value::from(format_timestamp(captured_at)),
        );
        enriched.insert(self.schema.service.clone(), Value::from(self.service.as_str()));
        if let Some(context) = context {
            enriched.extend(context);
        }
        if let Some(id) = correlation_id {
            enriched.insert(self.schema.correlation.clone(), Value::from(id));
        }
        enriched
    }

    fn report_failure(&self, what: &str, detail: &dyn Display) {
        report(self.runtime_mode, what, detail);
    }
}

fn report(runtime_mode: RuntimeMode, what: &str, detail: &dyn Display) {
    if runtime_mode.is_development() {
        warn!("LOGGER | {}: {}", what, detail);
    } else {
        debug!("LOGGER | {}: {}", what, detail);
    }
}

fn render(
    level: LogLevel,
    message: &str,
    captured_at: DateTime<Utc>,
    context: &Map<String, Value>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&json!({
        "level": level,
        "message": message,
        "timestamp": format_timestamp(captured_at),
        "context": context,
    }))
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.registry.flush_all();
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.get_level())
            .field("runtime_mode", &self.runtime_mode)
            .field("endpoint", &self.endpoint)
            .field("service", &self.service)
            .field("browser", &self.runtime.is_browser())
            .field("pipelines", &self.registry)
            .finish_non_exhaustive()
    }
}
