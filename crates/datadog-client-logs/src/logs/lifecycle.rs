// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Teardown hooks forcing a final flush.

use std::sync::Arc;

use tracing::debug;

use crate::logs::queue::LogEventQueue;
use crate::runtime::{RuntimeEnvironment, TeardownId};

/// Registers a page-hide/unload handler that force-flushes `queue`.
///
/// Called once per queue, when it is created. The handler only holds a weak
/// reference: a disposed queue is never flushed. The returned id is handed
/// back to [`unregister`] when the queue is discarded.
pub fn register(runtime: &dyn RuntimeEnvironment, queue: &Arc<LogEventQueue>) -> Option<TeardownId> {
    let queue = Arc::downgrade(queue);
    runtime.on_teardown(Box::new(move |signal| {
        let Some(queue) = queue.upgrade() else {
            return;
        };
        if queue.is_empty() {
            return;
        }
        debug!("LIFECYCLE | {} received, flushing {} log(s)", signal, queue.len());
        queue.flush();
    }))
}

pub fn unregister(runtime: &dyn RuntimeEnvironment, id: Option<TeardownId>) {
    if let Some(id) = id {
        runtime.remove_teardown(id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::ManualScheduler;
    use crate::config::log_level::LogLevel;
    use crate::correlation::CorrelationIdProvider;
    use crate::logs::event::LogEvent;
    use crate::logs::queue::tests::RecordingTransport;
    use crate::runtime::{LifecycleSignal, PageRuntime};
    use serde_json::Map;
    use std::time::Duration;

    fn setup() -> (Arc<PageRuntime>, Arc<LogEventQueue>, Arc<RecordingTransport>) {
        let (runtime, queue, transport, _) = setup_with_id();
        (runtime, queue, transport)
    }

    fn setup_with_id() -> (
        Arc<PageRuntime>,
        Arc<LogEventQueue>,
        Arc<RecordingTransport>,
        Option<TeardownId>,
    ) {
        let runtime = Arc::new(PageRuntime::default());
        let transport = Arc::new(RecordingTransport::default());
        let queue = Arc::new(LogEventQueue::new(
            10,
            Duration::from_millis(5000),
            Arc::new(ManualScheduler::new()),
            transport.clone(),
            Arc::new(CorrelationIdProvider::new(runtime.clone())),
        ));
        let id = register(runtime.as_ref(), &queue);
        (runtime, queue, transport, id)
    }

    #[test]
    fn test_signal_flushes_pending_events() {
        let (runtime, queue, transport) = setup();
        queue.add(LogEvent::new(LogLevel::Error, "checkout failed", Map::new()));

        runtime.dispatch(LifecycleSignal::PageHide);

        assert_eq!(transport.batches(), vec![vec!["checkout failed".to_string()]]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_signal_on_empty_queue_is_noop() {
        let (runtime, _queue, transport) = setup();
        runtime.dispatch(LifecycleSignal::Unload);
        assert!(transport.batches().is_empty());
    }

    #[test]
    fn test_hide_then_unload_delivers_once() {
        let (runtime, queue, transport) = setup();
        queue.add(LogEvent::new(LogLevel::Info, "a", Map::new()));

        runtime.dispatch(LifecycleSignal::PageHide);
        runtime.dispatch(LifecycleSignal::Unload);

        assert_eq!(transport.batches().len(), 1);
    }

    #[test]
    fn test_dropped_queue_is_ignored() {
        let (runtime, queue, transport) = setup();
        queue.add(LogEvent::new(LogLevel::Info, "a", Map::new()));
        drop(queue);

        runtime.dispatch(LifecycleSignal::Unload);
        assert!(transport.batches().is_empty());
    }

    #[test]
    fn test_unregister_removes_handler() {
        let (runtime, queue, transport, id) = setup_with_id();
        assert!(id.is_some());
        queue.add(LogEvent::new(LogLevel::Info, "a", Map::new()));

        unregister(runtime.as_ref(), id);

        assert_eq!(runtime.teardown_handler_count(), 0);
        runtime.dispatch(LifecycleSignal::Unload);
        assert!(transport.batches().is_empty());
        assert_eq!(queue.len(), 1);
    }
}
