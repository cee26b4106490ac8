// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Datadog Client Logs
//!
//! Correlated log batching and best-effort delivery for interactive clients
//! (browser-like pages, webviews, embedded hosts) with a console-interception
//! adapter for server-side processes.
//!
//! ## Overview
//!
//! Every log call goes through the [`facade::Logger`]:
//!
//! ```text
//!   caller ── info("user login", {userId: 42})
//!      │
//!      v
//!   ┌──────────────┐   resolve()   ┌───────────────────────┐
//!   │    Logger    │ ────────────> │ CorrelationIdProvider │ (cookie → session → uuid)
//!   └──────┬───────┘               └───────────────────────┘
//!          │ enrich
//!          ├──────────────> ConsoleSink (one JSON line per call)
//!          │
//!          v  browser runtime + endpoint
//!   ┌──────────────┐  size / timer / teardown  ┌───────────┐
//!   │ LogEventQueue│ ────────────────────────> │ Transport │ ── beacon | HTTP POST
//!   └──────────────┘                           └───────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`]: environment-driven configuration, log level and runtime mode
//! - [`correlation`]: correlation id resolution and cookie carrier parsing
//! - [`logs`]: queue, payload, transport, per-endpoint registry and lifecycle hooks
//! - [`facade`]: the public `debug/info/warn/error` API
//! - [`intercept`]: global `log` crate interception for non-browser runtimes
//! - [`runtime`]: the injected runtime capabilities (page vs. server)
//! - [`clock`]: timer scheduling (tokio and virtual time)
//! - [`event_bus`]: observable delivery outcomes
//!
//! Logging must never destabilize the host application: nothing in this crate
//! panics or returns an error out of a log call.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]

/// Timer scheduling abstraction for flush triggers
pub mod clock;

/// Configuration management - environment variables and defaults
pub mod config;

/// Correlation identifier resolution and carrier parsing
pub mod correlation;

/// Error types for delivery and installation
pub mod error;

/// Observable delivery outcomes
pub mod event_bus;

/// Structured logging facade (debug/info/warn/error)
pub mod facade;

/// HTTP client construction
pub mod http;

/// Console interception for non-browser runtimes
pub mod intercept;

/// Diagnostics formatter and subscriber setup
pub mod logger;

/// Log queueing, batching and delivery
pub mod logs;

/// Injected runtime capabilities
pub mod runtime;

/// Local console sinks
pub mod sink;

pub use config::{log_level::LogLevel, Config};
pub use facade::Logger;

/// Crate version reported in diagnostics.
pub const CLIENT_LOGS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Locks a mutex, recovering the guard if a previous holder panicked.
///
/// Every critical section in this crate is a short, non-suspending buffer
/// mutation, so the protected data is still consistent after a poisoning panic.
pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
