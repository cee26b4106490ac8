// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Ordered in-memory buffer with size and time flush triggers.
//!
//! # Triggers
//!
//! After every [`LogEventQueue::add`]:
//!
//! - **Size**: the buffer reached `capacity` events, so it is flushed
//!   immediately
//! - **Time**: no timer is pending, so a single-shot timer is armed to flush
//!   after `interval`
//!
//! Every flush path (size, timer, forced) cancels the pending timer, so at most
//! one timer exists per queue. Timers also carry a generation number; a timer
//! that fires after its cycle ended (cancelled too late, or superseded) sees a
//! different generation and does nothing.
//!
//! # Locking
//!
//! The buffer lives behind a mutex that is only held for the push or the
//! drain itself. Delivery always happens after the lock is released, so a
//! concurrent flush can only ever observe an already-empty buffer. A panicking
//! transport loses its batch and nothing else.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::clock::{Scheduler, TimerHandle};
use crate::correlation::CorrelationIdProvider;
use crate::event_bus::{DeliveryEvent, DropReason, EventSender};
use crate::lock;
use crate::logs::event::{Batch, LogEvent};
use crate::logs::transport::Transport;

#[derive(Default)]
struct QueueState {
    buffer: VecDeque<LogEvent>,
    timer: Option<PendingFlush>,
    generation: u64,
}

struct PendingFlush {
    generation: u64,
    handle: TimerHandle,
}

/// Event buffer paired with the transport of one endpoint.
pub struct LogEventQueue {
    state: Mutex<QueueState>,
    capacity: usize,
    interval: Duration,
    scheduler: Arc<dyn Scheduler>,
    transport: Arc<dyn Transport>,
    correlation: Arc<CorrelationIdProvider>,
    events: Option<EventSender>,
}

impl LogEventQueue {
    /// A `capacity` of zero is treated as one.
    #[must_use]
    pub fn new(
        capacity: usize,
        interval: Duration,
        scheduler: Arc<dyn Scheduler>,
        transport: Arc<dyn Transport>,
        correlation: Arc<CorrelationIdProvider>,
    ) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            capacity: capacity.max(1),
            interval,
            scheduler,
            transport,
            correlation,
            events: None,
        }
    }

    /// Publishes batches lost inside the transport itself, which the
    /// transport cannot report.
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Appends an event and evaluates the flush triggers.
    pub fn add(self: &Arc<Self>, event: LogEvent) {
        let batch = {
            let mut state = lock(&self.state);
            state.buffer.push_back(event);
            if state.buffer.len() >= self.capacity {
                Some(self.take(&mut state))
            } else {
                if state.timer.is_none() {
                    self.arm_timer(&mut state);
                }
                None
            }
        };
        if let Some(batch) = batch {
            debug!("QUEUE | Batch capacity reached, flushing {} log(s)", batch.len());
            self.deliver(batch);
        }
    }

    /// Takes every buffered event and cancels the pending timer.
    ///
    /// Returns `None` when the buffer is empty.
    pub fn drain_all(&self) -> Option<Batch> {
        let mut state = lock(&self.state);
        if state.buffer.is_empty() {
            self.cancel_timer(&mut state);
            return None;
        }
        Some(self.take(&mut state))
    }

    /// Forced flush. A no-op on an empty queue.
    pub fn flush(&self) {
        if let Some(batch) = self.drain_all() {
            self.deliver(batch);
        }
    }

    /// Cancels the pending timer and discards buffered events.
    pub fn dispose(&self) {
        let mut state = lock(&self.state);
        self.cancel_timer(&mut state);
        let discarded = state.buffer.len();
        state.buffer.clear();
        if discarded > 0 {
            debug!("QUEUE | Disposed queue with {} undelivered log(s)", discarded);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.state).buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.state).buffer.is_empty()
    }

    #[must_use]
    pub fn has_pending_timer(&self) -> bool {
        lock(&self.state).timer.is_some()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn arm_timer(self: &Arc<Self>, state: &mut QueueState) {
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let queue = Arc::downgrade(self);
        // Scheduled under the state lock: a timer firing early blocks on the
        // lock until its handle is recorded.
        let handle = self.scheduler.schedule_after(
            self.interval,
            Box::new(move || {
                if let Some(queue) = queue.upgrade() {
                    queue.flush_from_timer(generation);
                }
            }),
        );
        if handle.is_cancelled() {
            debug!("QUEUE | Flush timer could not be armed, waiting for size or forced flush");
            return;
        }
        state.timer = Some(PendingFlush { generation, handle });
    }

    fn flush_from_timer(&self, generation: u64) {
        let batch = {
            let mut state = lock(&self.state);
            let current = state
                .timer
                .as_ref()
                .is_some_and(|pending| pending.generation == generation);
            if current {
                state.timer = None;
            }
            if !current || state.buffer.is_empty() {
                None
            } else {
                Some(state.buffer.drain(..).collect::<Batch>())
            }
        };
        if let Some(batch) = batch {
            debug!("QUEUE | Flush interval elapsed, flushing {} log(s)", batch.len());
            self.deliver(batch);
        }
    }

    fn take(&self, state: &mut QueueState) -> Batch {
        self.cancel_timer(state);
        state.buffer.drain(..).collect()
    }

    fn cancel_timer(&self, state: &mut QueueState) {
        if let Some(pending) = state.timer.take() {
            self.scheduler.cancel(&pending.handle);
        }
    }

    fn deliver(&self, batch: Batch) {
        let count = batch.len();
        let correlation_id = self.correlation.resolve();
        let sent = panic::catch_unwind(AssertUnwindSafe(|| {
            self.transport.send(batch, correlation_id);
        }));
        if sent.is_err() {
            debug!("QUEUE | Transport panicked, dropped {} log(s)", count);
            if let Some(events) = &self.events {
                events.publish(DeliveryEvent::Dropped {
                    count,
                    reason: DropReason::TransportPanicked,
                });
            }
        }
    }
}

impl std::fmt::Debug for LogEventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogEventQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("interval", &self.interval)
            .field("pending_timer", &self.has_pending_timer())
            .finish_non_exhaustive()
    }
}
