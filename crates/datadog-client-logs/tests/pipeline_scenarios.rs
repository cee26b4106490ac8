// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, Mutex};
use std::time::Duration;

use datadog_client_logs::clock::ManualScheduler;
use datadog_client_logs::event_bus::{DeliveryEvent, DropReason, EventBus};
use datadog_client_logs::logs::event::Batch;
use datadog_client_logs::logs::transport::Transport;
use datadog_client_logs::runtime::{LifecycleSignal, PageRuntime};
use datadog_client_logs::sink::MemorySink;
use datadog_client_logs::{Config, Logger};
use serde_json::json;

const ENDPOINT: &str = "https://logs.example.com/v1/input";

#[derive(Default)]
struct RecordingTransport {
    calls: Mutex<Vec<(Vec<String>, Option<String>)>>,
}

impl RecordingTransport {
    fn calls(&self) -> Vec<(Vec<String>, Option<String>)> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.calls().iter().map(|(batch, _)| batch.len()).collect()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, batch: Batch, correlation_id: Option<String>) {
        let messages = batch.iter().map(|e| e.message().to_string()).collect();
        self.calls
            .lock()
            .expect("lock poisoned")
            .push((messages, correlation_id));
    }
}

struct PanickingTransport;

impl Transport for PanickingTransport {
    fn send(&self, _batch: Batch, _correlation_id: Option<String>) {
        panic!("network stack exploded");
    }
}

struct Harness {
    logger: Logger,
    runtime: Arc<PageRuntime>,
    scheduler: Arc<ManualScheduler>,
    sink: Arc<MemorySink>,
    transport: Arc<RecordingTransport>,
}

fn config() -> Config {
    Config {
        endpoint: Some(ENDPOINT.to_string()),
        batch_capacity: 10,
        flush_interval: Duration::from_millis(5000),
        ..Config::default()
    }
}

fn harness_with_runtime(runtime: PageRuntime) -> Harness {
    let runtime = Arc::new(runtime);
    let scheduler = Arc::new(ManualScheduler::new());
    let sink = Arc::new(MemorySink::new());
    let transport = Arc::new(RecordingTransport::default());
    let shared = Arc::clone(&transport);
    let logger = Logger::builder(config())
        .runtime(runtime.clone())
        .scheduler(scheduler.clone())
        .sink(sink.clone())
        .transport_factory(Arc::new(move |_: &str| {
            Arc::clone(&shared) as Arc<dyn Transport>
        }))
        .build();
    Harness {
        logger,
        runtime,
        scheduler,
        sink,
        transport,
    }
}

fn harness() -> Harness {
    harness_with_runtime(PageRuntime::default())
}

#[test]
fn nine_events_flush_when_interval_elapses() {
    let h = harness();
    for i in 0..9 {
        h.logger.info(&format!("event {i}"), None);
        h.scheduler.advance(Duration::from_millis(100));
    }
    assert!(h.transport.calls().is_empty());

    // First event was at t=0, we are now at t=900.
    h.scheduler.advance(Duration::from_millis(4099));
    assert!(h.transport.calls().is_empty());

    h.scheduler.advance(Duration::from_millis(1));
    let calls = h.transport.calls();
    assert_eq!(calls.len(), 1);
    let expected: Vec<String> = (0..9).map(|i| format!("event {i}")).collect();
    assert_eq!(calls[0].0, expected);

    h.scheduler.advance(Duration::from_secs(60));
    assert_eq!(h.transport.calls().len(), 1);
}

#[test]
fn ten_events_flush_immediately() {
    let h = harness();
    for i in 0..10 {
        h.logger.info(&format!("event {i}"), None);
    }

    assert_eq!(h.transport.batch_sizes(), vec![10]);
    assert_eq!(h.scheduler.pending(), 0);

    h.logger.flush();
    h.scheduler.advance(Duration::from_secs(10));
    assert_eq!(h.transport.batch_sizes(), vec![10]);
}

#[test]
fn forced_flush_on_empty_queue_is_noop() {
    let h = harness();
    h.logger.flush();
    h.runtime.dispatch(LifecycleSignal::Unload);
    assert!(h.transport.calls().is_empty());
}

#[test]
fn user_login_record_and_correlation_reuse() {
    let h = harness();
    h.logger.info(
        "user login",
        json!({"userId": 42}).as_object().cloned(),
    );
    h.logger.info("next call", None);

    let records = h.sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["level"], "info");
    assert_eq!(records[0]["message"], "user login");
    assert_eq!(records[0]["context"]["userId"], 42);

    let first = records[0]["context"]["correlation_id"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert!(!first.is_empty());
    assert_eq!(records[1]["context"]["correlation_id"], first.as_str());

    h.logger.flush();
    assert_eq!(h.transport.calls()[0].1.as_deref(), Some(first.as_str()));
}

#[test]
fn carrier_value_overrides_session_id() {
    let h = harness();
    h.logger.info("before carrier", None);
    h.runtime
        .set_cookie_header(Some("theme=dark; correlation_id=edge-abc".to_string()));
    h.logger.info("with carrier", None);
    h.logger.info("still with carrier", None);

    let records = h.sink.records();
    assert_ne!(records[0]["context"]["correlation_id"], "edge-abc");
    assert_eq!(records[1]["context"]["correlation_id"], "edge-abc");
    assert_eq!(records[2]["context"]["correlation_id"], "edge-abc");

    h.logger.flush();
    assert_eq!(h.transport.calls()[0].1.as_deref(), Some("edge-abc"));
}

#[test]
fn teardown_flushes_pending_events() {
    let h = harness();
    h.logger.warn("about to leave", None);
    h.runtime.dispatch(LifecycleSignal::PageHide);
    h.runtime.dispatch(LifecycleSignal::Unload);

    assert_eq!(h.transport.batch_sizes(), vec![1]);
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn rejected_beacon_drops_batch_and_pipeline_keeps_working() {
    let beacon_calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&beacon_calls);
    let runtime = Arc::new(
        PageRuntime::builder()
            .beacon(move |_, _| {
                *counter.lock().expect("lock poisoned") += 1;
                false
            })
            .build(),
    );
    let (mut bus, events) = EventBus::run();
    let logger = Logger::builder(config())
        .runtime(runtime)
        .scheduler(Arc::new(ManualScheduler::new()))
        .sink(Arc::new(MemorySink::new()))
        .events(events)
        .build();

    for i in 0..10 {
        logger.error(&format!("event {i}"), None);
    }
    logger.info("after drop", None);
    logger.flush();

    assert_eq!(*beacon_calls.lock().expect("lock poisoned"), 2);
    assert_eq!(
        bus.drain(),
        vec![
            DeliveryEvent::Dropped {
                count: 10,
                reason: DropReason::BeaconRejected
            },
            DeliveryEvent::Dropped {
                count: 1,
                reason: DropReason::BeaconRejected
            },
        ]
    );
}

#[test]
fn failing_transport_never_escapes() {
    let sink = Arc::new(MemorySink::new());
    let (mut bus, events) = EventBus::run();
    let logger = Logger::builder(Config {
        batch_capacity: 2,
        ..config()
    })
    .runtime(Arc::new(PageRuntime::default()))
    .scheduler(Arc::new(ManualScheduler::new()))
    .sink(sink.clone())
    .transport_factory(Arc::new(|_: &str| {
        Arc::new(PanickingTransport) as Arc<dyn Transport>
    }))
    .events(events)
    .build();

    for i in 0..5 {
        logger.info(&format!("event {i}"), None);
    }
    logger.flush();

    assert_eq!(sink.len(), 5);
    assert_eq!(logger.pipeline_count(), 1);
    let dropped: Vec<usize> = bus
        .drain()
        .into_iter()
        .map(|event| match event {
            DeliveryEvent::Dropped {
                count,
                reason: DropReason::TransportPanicked,
            } => count,
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(dropped, vec![2, 2, 1]);
    logger.dispose();
}

#[test]
fn interval_flush_without_caller_runtime() {
    let beacons = Arc::new(Mutex::new(Vec::<Vec<u8>>::new()));
    let received = Arc::clone(&beacons);
    let runtime = PageRuntime::builder()
        .beacon(move |_, body| {
            received.lock().expect("lock poisoned").push(body.to_vec());
            true
        })
        .build();
    let logger = Logger::builder(Config {
        flush_interval: Duration::from_millis(50),
        ..config()
    })
    .runtime(Arc::new(runtime))
    .sink(Arc::new(MemorySink::new()))
    .build();

    logger.info("below capacity", None);

    let mut waited = Duration::ZERO;
    while beacons.lock().expect("lock poisoned").is_empty() && waited < Duration::from_secs(5) {
        std::thread::sleep(Duration::from_millis(10));
        waited += Duration::from_millis(10);
    }
    std::thread::sleep(Duration::from_millis(100));

    let beacons = beacons.lock().expect("lock poisoned");
    assert_eq!(beacons.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&beacons[0]).expect("json body");
    assert_eq!(body["logs"][0]["message"], "below capacity");
}

#[test]
fn dispose_isolates_runs() {
    let h = harness();
    h.logger.info("buffered", None);
    h.logger.dispose();
    h.scheduler.advance(Duration::from_secs(10));
    assert!(h.transport.calls().is_empty());
    assert_eq!(h.logger.pipeline_count(), 0);

    h.logger.info("fresh", None);
    h.scheduler.advance(Duration::from_millis(5000));
    assert_eq!(h.transport.calls()[0].0, vec!["fresh".to_string()]);
}
