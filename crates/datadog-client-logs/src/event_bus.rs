// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery outcome events.
//!
//! Delivery is fire-and-forget, but its outcome is observable: every batch
//! handed to a transport produces exactly one [`DeliveryEvent`] on the bus
//! (when a bus is attached).
//!
//! ```text
//! Transports (many)        EventBus          Consumer (one)
//!     │                       │                    │
//!     ├─ Delivered ──────────>│                    │
//!     └─ Dropped ────────────>│ ──> MPSC ───────> rx
//! ```
//!
//! Publishing uses `try_send`: a full or closed bus loses the notification,
//! never blocks the producer.

use tokio::sync::mpsc::{self, error::TrySendError, Sender};
use tracing::debug;

/// Bounded capacity of the delivery event channel.
pub const MAX_EVENTS: usize = 100;

/// Why a batch was permanently lost.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The payload could not be serialized.
    Serialization,
    /// The network call failed before a response arrived.
    Network,
    /// The endpoint answered with a non-success status.
    Status(u16),
    /// The lifecycle-safe primitive refused to queue the payload.
    BeaconRejected,
    /// No async runtime was available to issue the network call.
    NoAsyncRuntime,
    /// The transport panicked while handling the batch.
    TransportPanicked,
}

/// Outcome of one delivery attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeliveryEvent {
    /// The batch was accepted by the delivery primitive or the endpoint.
    Delivered {
        /// Number of log events in the batch
        count: usize,
    },
    /// The batch was dropped and will never be retried.
    Dropped {
        /// Number of log events lost
        count: usize,
        /// Failure classification
        reason: DropReason,
    },
}

/// Receiving side of the delivery event channel.
pub struct EventBus {
    pub rx: mpsc::Receiver<DeliveryEvent>,
}

impl EventBus {
    /// Creates the bus and returns the sender to hand to the logger.
    #[must_use]
    pub fn run() -> (EventBus, EventSender) {
        let (tx, rx) = mpsc::channel(MAX_EVENTS);
        (EventBus { rx }, EventSender { tx })
    }

    /// Returns every event currently buffered without waiting.
    pub fn drain(&mut self) -> Vec<DeliveryEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Cloneable, non-blocking publisher.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: Sender<DeliveryEvent>,
}

impl EventSender {
    pub fn publish(&self, event: DeliveryEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                debug!("EVENT_BUS | Event bus full, discarding {:?}", event);
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
