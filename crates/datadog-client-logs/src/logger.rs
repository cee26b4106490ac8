// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Diagnostics output for the crate itself.
//!
//! Dropped batches, configuration problems and lifecycle flushes are reported
//! through `tracing`. Each message starts with the component that emitted it
//! (`QUEUE`, `DELIVERY`, `CONFIG`, ...); the formatter adds the crate prefix
//! and the level in front, so diagnostics stand apart from the application's
//! own console records:
//!
//! ```text
//! CLIENT_LOGS | LEVEL | [span{fields}: ...] COMPONENT | message {event_fields}
//! ```
//!
//! # Examples
//!
//! ```text
//! CLIENT_LOGS | DEBUG | QUEUE | Flush interval elapsed, flushing 3 log(s)
//! CLIENT_LOGS | WARN | delivery{endpoint=https://logs.example.com/v1/input}: DELIVERY | Dropped 2 log(s) for https://logs.example.com/v1/input: Request failed
//! ```
//!
//! [`init_diagnostics`] installs a global subscriber using the formatter. It
//! uses `set_global_default` directly and does not register a `log` bridge,
//! so the global `log` logger stays free for
//! [`ConsoleInterceptor`](crate::intercept::ConsoleInterceptor).

use std::fmt;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::config::{log_level::LogLevel, Config};
use crate::error::InstallError;

/// Event formatter for the crate's diagnostics.
///
/// Spans are written outermost first. The transport opens a `delivery` span
/// carrying the endpoint, so outcome reports name the pipeline they belong to
/// even when several endpoints are in use.
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(&mut writer, "CLIENT_LOGS | {} | ", event.metadata().level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        // Message first, then any structured event fields
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Filter directive for the diagnostics subscriber.
///
/// Development builds see this crate's diagnostics down to `debug`; production
/// builds follow the configured level. Transport dependencies are silenced.
#[must_use]
pub fn diagnostics_filter(config: &Config) -> String {
    let level = if config.runtime_mode.is_development() {
        LogLevel::Debug
    } else {
        config.level
    };
    format!("h2=off,hyper=off,rustls=off,reqwest=off,{level}")
}

/// Installs the global diagnostics subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_diagnostics(config: &Config) -> Result<(), InstallError> {
    let filter = EnvFilter::try_new(diagnostics_filter(config))
        .map_err(|e| InstallError::Subscriber(e.to_string()))?;

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(Formatter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| InstallError::Subscriber(e.to_string()))
}
