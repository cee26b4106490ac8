// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire format of a delivered batch.
//!
//! ```json
//! {
//!   "correlationId": "4f1c0a8e-...",
//!   "logs": [
//!     {"level": "info", "message": "user login", "context": {"userId": 42}, "timestamp": "2025-03-01T12:00:00.000Z"}
//!   ],
//!   "diagnosticMetadata": {"userAgentString": "Mozilla/5.0 ...", "pageUrl": "https://shop.example.com/cart"}
//! }
//! ```
//!
//! `correlationId` is omitted when no id could be resolved; metadata fields are
//! `null` when the runtime does not expose them.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::log_level::LogLevel;
use crate::error::DeliveryError;
use crate::logs::event::LogEvent;
use crate::runtime::RuntimeEnvironment;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<&'a str>,
    pub logs: Vec<PayloadEntry<'a>>,
    pub diagnostic_metadata: DiagnosticMetadata,
}

#[derive(Debug, Serialize)]
pub struct PayloadEntry<'a> {
    pub level: LogLevel,
    pub message: &'a str,
    pub context: &'a Map<String, Value>,
    pub timestamp: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticMetadata {
    pub user_agent_string: Option<String>,
    pub page_url: Option<String>,
}

impl DiagnosticMetadata {
    #[must_use]
    pub fn from_runtime(runtime: &dyn RuntimeEnvironment) -> Self {
        Self {
            user_agent_string: runtime.user_agent(),
            page_url: runtime.page_url(),
        }
    }
}

impl<'a> DeliveryPayload<'a> {
    #[must_use]
    pub fn new(
        batch: &'a [LogEvent],
        correlation_id: Option<&'a str>,
        diagnostic_metadata: DiagnosticMetadata,
    ) -> Self {
        let logs = batch
            .iter()
            .map(|event| PayloadEntry {
                level: event.level(),
                message: event.message(),
                context: event.context(),
                timestamp: event.timestamp(),
            })
            .collect();
        Self {
            correlation_id,
            logs,
            diagnostic_metadata,
        }
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, DeliveryError> {
        Ok(serde_json::to_vec(self)?)
    }
}
