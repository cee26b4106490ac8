// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-endpoint queue + transport pairs.
//!
//! Each delivery endpoint gets its own [`LogEventQueue`] and transport, built
//! lazily on the first event for that endpoint. The teardown hook is
//! registered at that moment, once per pair.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::clock::Scheduler;
use crate::correlation::CorrelationIdProvider;
use crate::event_bus::EventSender;
use crate::lock;
use crate::logs::lifecycle;
use crate::logs::queue::LogEventQueue;
use crate::logs::transport::Transport;
use crate::runtime::{RuntimeEnvironment, TeardownId};

/// Builds the transport for an endpoint.
pub type TransportFactory = Arc<dyn Fn(&str) -> Arc<dyn Transport> + Send + Sync>;

struct Pipeline {
    queue: Arc<LogEventQueue>,
    teardown: Option<TeardownId>,
}

pub struct PipelineRegistry {
    pipelines: Mutex<HashMap<String, Pipeline>>,
    transport_factory: TransportFactory,
    scheduler: Arc<dyn Scheduler>,
    runtime: Arc<dyn RuntimeEnvironment>,
    correlation: Arc<CorrelationIdProvider>,
    capacity: usize,
    interval: Duration,
    events: Option<EventSender>,
}

impl PipelineRegistry {
    #[must_use]
    pub fn new(
        transport_factory: TransportFactory,
        scheduler: Arc<dyn Scheduler>,
        runtime: Arc<dyn RuntimeEnvironment>,
        correlation: Arc<CorrelationIdProvider>,
        capacity: usize,
        interval: Duration,
        events: Option<EventSender>,
    ) -> Self {
        Self {
            pipelines: Mutex::new(HashMap::new()),
            transport_factory,
            scheduler,
            runtime,
            correlation,
            capacity,
            interval,
            events,
        }
    }

    /// Returns the queue for `endpoint`, creating the pair on first use.
    pub fn queue_for(&self, endpoint: &str) -> Arc<LogEventQueue> {
        let mut pipelines = lock(&self.pipelines);
        if let Some(pipeline) = pipelines.get(endpoint) {
            return Arc::clone(&pipeline.queue);
        }

        debug!("PIPELINE | Creating delivery pipeline for {}", endpoint);
        let mut queue = LogEventQueue::new(
            self.capacity,
            self.interval,
            Arc::clone(&self.scheduler),
            (self.transport_factory)(endpoint),
            Arc::clone(&self.correlation),
        );
        if let Some(events) = &self.events {
            queue = queue.with_events(events.clone());
        }
        let queue = Arc::new(queue);
        let teardown = lifecycle::register(self.runtime.as_ref(), &queue);
        pipelines.insert(
            endpoint.to_string(),
            Pipeline {
                queue: Arc::clone(&queue),
                teardown,
            },
        );
        queue
    }

    /// Force-flushes every pair. Empty queues are skipped.
    pub fn flush_all(&self) {
        for queue in self.snapshot() {
            queue.flush();
        }
    }

    /// Cancels every timer, discards buffered events and forgets every pair
    /// along with its teardown hook.
    pub fn dispose(&self) {
        let pipelines: Vec<Pipeline> = lock(&self.pipelines)
            .drain()
            .map(|(_, pipeline)| pipeline)
            .collect();
        for pipeline in pipelines {
            pipeline.queue.dispose();
            lifecycle::unregister(self.runtime.as_ref(), pipeline.teardown);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.pipelines).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.pipelines).is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<LogEventQueue>> {
        lock(&self.pipelines)
            .values()
            .map(|pipeline| Arc::clone(&pipeline.queue))
            .collect()
    }
}

impl Drop for PipelineRegistry {
    fn drop(&mut self) {
        let pipelines = self
            .pipelines
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for (_, pipeline) in pipelines.drain() {
            lifecycle::unregister(self.runtime.as_ref(), pipeline.teardown);
        }
    }
}

impl std::fmt::Debug for PipelineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let endpoints: Vec<String> = lock(&self.pipelines).keys().cloned().collect();
        f.debug_struct("PipelineRegistry")
            .field("endpoints", &endpoints)
            .field("capacity", &self.capacity)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
