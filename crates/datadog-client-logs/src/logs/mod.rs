// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log queueing, batching and delivery.
//!
//! # Pipeline
//!
//! ```text
//!   Logger
//!     │ queue_for(endpoint)
//!     v
//!   ┌──────────────────┐
//!   │ PipelineRegistry │ (one pair per endpoint, created lazily)
//!   └────────┬─────────┘
//!            v
//!   ┌──────────────────┐  capacity reached / timer fired / teardown
//!   │  LogEventQueue   │ ───────────────────────────────────────────┐
//!   └──────────────────┘                                            │
//!                                                                   v
//!                                                          ┌──────────────┐
//!                                                          │  Transport   │
//!                                                          └──────┬───────┘
//!                                                                 │
//!                                               beacon or HTTP POST, never retried
//! ```
//!
//! # Modules
//!
//! - [`event`]: `LogEvent` and `Batch`
//! - [`queue`]: ordered buffer with size and time triggers
//! - [`payload`]: wire format
//! - [`transport`]: beacon / HTTP delivery and outcome reporting
//! - [`registry`]: endpoint-keyed queue + transport pairs
//! - [`lifecycle`]: teardown flush hooks
//! - [`constants`]: defaults and header names

pub mod constants;
pub mod event;
pub mod lifecycle;
pub mod payload;
pub mod queue;
pub mod registry;
pub mod transport;
