// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Best-effort batch delivery.
//!
//! # Path selection
//!
//! ```text
//!   send(batch, correlation_id)
//!        │
//!        v
//!   serialize payload ──(error)──> Dropped(Serialization)
//!        │
//!        ├── runtime has beacon ──> send_beacon(url, body)
//!        │                              ├─ accepted ──> Delivered
//!        │                              └─ refused ───> Dropped(BeaconRejected)
//!        │
//!        └── otherwise ──> spawn POST (json body + x-correlation-id header)
//!                              ├─ 2xx ──────────> Delivered
//!                              ├─ other status ─> Dropped(Status)
//!                              └─ error ────────> Dropped(Network)
//! ```
//!
//! Nothing is retried and nothing is returned to the caller. Outcomes go to
//! the diagnostics channel (`warn!` in development, `debug!` in production)
//! and, when attached, to the delivery event bus.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use tokio::runtime::Handle;
use tracing::{debug, debug_span, warn};

use crate::clock::current_or_background;
use crate::config::{runtime_mode::RuntimeMode, Config};
use crate::error::DeliveryError;
use crate::event_bus::{DeliveryEvent, EventSender};
use crate::logs::constants::CORRELATION_HEADER;
use crate::logs::event::Batch;
use crate::logs::payload::{DeliveryPayload, DiagnosticMetadata};
use crate::runtime::RuntimeEnvironment;

/// Fire-and-forget delivery of one batch.
///
/// Implementations must never panic and never block on I/O.
pub trait Transport: Send + Sync {
    fn send(&self, batch: Batch, correlation_id: Option<String>);
}

/// Reports delivery outcomes to diagnostics and the event bus.
#[derive(Debug, Clone)]
struct OutcomeReporter {
    endpoint: String,
    runtime_mode: RuntimeMode,
    events: Option<EventSender>,
}

impl OutcomeReporter {
    fn report(&self, count: usize, result: Result<(), DeliveryError>) {
        let _span = debug_span!("delivery", endpoint = %self.endpoint).entered();
        let event = match result {
            Ok(()) => {
                debug!(
                    "DELIVERY | Delivered {} log(s) to {}",
                    count, self.endpoint
                );
                DeliveryEvent::Delivered { count }
            }
            Err(e) => {
                if self.runtime_mode.is_development() {
                    warn!(
                        "DELIVERY | Dropped {} log(s) for {}: {}",
                        count, self.endpoint, e
                    );
                } else {
                    debug!(
                        "DELIVERY | Dropped {} log(s) for {}: {}",
                        count, self.endpoint, e
                    );
                }
                DeliveryEvent::Dropped {
                    count,
                    reason: e.drop_reason(),
                }
            }
        };
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

/// Delivers batches to one endpoint through the runtime's beacon or HTTP.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
    runtime: Arc<dyn RuntimeEnvironment>,
    handle: Option<Handle>,
    reporter: OutcomeReporter,
}

impl HttpTransport {
    /// Creates a transport bound to the tokio runtime of the calling context,
    /// or to the crate's background runtime outside of one.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        client: reqwest::Client,
        runtime: Arc<dyn RuntimeEnvironment>,
        config: &Config,
    ) -> Self {
        let endpoint = endpoint.into();
        HttpTransport {
            reporter: OutcomeReporter {
                endpoint: endpoint.clone(),
                runtime_mode: config.runtime_mode,
                events: None,
            },
            endpoint,
            client,
            runtime,
            handle: current_or_background(),
        }
    }

    /// Spawns network deliveries on `handle`.
    #[must_use]
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Publishes every outcome on the delivery event bus.
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.reporter.events = Some(events);
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn create_request(&self, body: Vec<u8>, correlation_id: Option<&str>) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json");
        if let Some(id) = correlation_id {
            request = request.header(CORRELATION_HEADER, id);
        }
        request.body(body)
    }

    async fn post(request: reqwest::RequestBuilder) -> Result<(), DeliveryError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status(status.as_u16()))
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("has_handle", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn send(&self, batch: Batch, correlation_id: Option<String>) {
        if batch.is_empty() {
            return;
        }
        let count = batch.len();
        let metadata = DiagnosticMetadata::from_runtime(self.runtime.as_ref());
        let body = match DeliveryPayload::new(&batch, correlation_id.as_deref(), metadata).to_vec()
        {
            Ok(body) => body,
            Err(e) => {
                self.reporter.report(count, Err(e));
                return;
            }
        };

        if self.runtime.has_beacon() {
            let result = if self.runtime.send_beacon(&self.endpoint, &body) {
                Ok(())
            } else {
                Err(DeliveryError::BeaconRejected)
            };
            self.reporter.report(count, result);
            return;
        }

        let Some(handle) = &self.handle else {
            self.reporter
                .report(count, Err(DeliveryError::NoAsyncRuntime));
            return;
        };
        let request = self.create_request(body, correlation_id.as_deref());
        let reporter = self.reporter.clone();
        handle.spawn(async move {
            let result = Self::post(request).await;
            reporter.report(count, result);
        });
    }
}
