// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::event_bus::DropReason;

/// Errors that end a single delivery attempt.
///
/// These never leave the transport: each one is turned into a dropped-batch
/// [`DeliveryEvent`](crate::event_bus::DeliveryEvent) and a diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Endpoint responded with status {0}")]
    Status(u16),

    #[error("Lifecycle-safe delivery primitive refused the payload")]
    BeaconRejected,

    #[error("No async runtime available to perform the request")]
    NoAsyncRuntime,
}

impl DeliveryError {
    /// The reason reported on the event bus for this failure.
    #[must_use]
    pub fn drop_reason(&self) -> DropReason {
        match self {
            DeliveryError::Serialization(_) => DropReason::Serialization,
            DeliveryError::Request(_) => DropReason::Network,
            DeliveryError::Status(status) => DropReason::Status(*status),
            DeliveryError::BeaconRejected => DropReason::BeaconRejected,
            DeliveryError::NoAsyncRuntime => DropReason::NoAsyncRuntime,
        }
    }
}

/// Errors returned when installing global hooks.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Console interception is only available in non-browser runtimes")]
    BrowserRuntime,

    #[error("A global logger is already installed: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Failed to install diagnostics subscriber: {0}")]
    Subscriber(String),
}
