// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batching and delivery constants.

use std::time::Duration;

/// Number of buffered events that triggers an immediate flush.
pub const DEFAULT_BATCH_CAPACITY: usize = 10;

/// Delay between the first event after a flush and the time-triggered flush.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(5000);

/// Timeout applied to each network delivery.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Header carrying the correlation id on the network-call path.
///
/// The lifecycle-safe primitive cannot set headers, so the id is always
/// repeated in the payload body.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Idle time before a pooled connection is closed.
pub(crate) const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(270);

/// TCP keep-alive probe interval.
pub(crate) const TCP_KEEPALIVE: Duration = Duration::from_secs(120);
