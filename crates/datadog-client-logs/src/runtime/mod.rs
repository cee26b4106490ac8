// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Runtime capabilities injected into the logging pipeline.
//!
//! The logger, the correlation provider and the transport never probe the host
//! themselves. They ask a [`RuntimeEnvironment`] whether they run inside a
//! browser-like page, whether a lifecycle-safe delivery primitive (a "beacon")
//! exists, what the carrier cookies are, and where to register teardown
//! handlers.
//!
//! # Implementations
//!
//! - [`PageRuntime`]: an interactive page hosted in a webview or embedded
//!   browser; the host feeds it cookies, metadata and lifecycle signals
//! - [`ServerRuntime`]: a plain process with none of those capabilities

use std::fmt;

pub mod page;
pub mod server;

pub use page::{PageRuntime, PageRuntimeBuilder};
pub use server::ServerRuntime;

/// Page lifecycle signal that forces a final flush.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// The page became hidden (tab switch, app backgrounded).
    PageHide,
    /// The page is being torn down.
    Unload,
}

impl fmt::Display for LifecycleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleSignal::PageHide => write!(f, "pagehide"),
            LifecycleSignal::Unload => write!(f, "unload"),
        }
    }
}

/// Callback run on every lifecycle signal.
pub type TeardownHandler = Box<dyn Fn(LifecycleSignal) + Send + Sync>;

/// Identifies a registered teardown handler so it can be removed again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TeardownId(u64);

impl TeardownId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Capabilities of the host the logger runs in.
///
/// Only [`is_browser`](RuntimeEnvironment::is_browser) is required; every
/// other capability defaults to "not available".
pub trait RuntimeEnvironment: Send + Sync {
    /// Whether this is an interactive, browser-like runtime.
    fn is_browser(&self) -> bool;

    /// Raw `Cookie` header visible to the page, if any.
    fn cookie_header(&self) -> Option<String> {
        None
    }

    /// Whether a delivery primitive that survives page teardown is available.
    fn has_beacon(&self) -> bool {
        false
    }

    /// Queues `body` for delivery to `url` through the lifecycle-safe primitive.
    ///
    /// Returns `false` when the primitive refused the payload.
    fn send_beacon(&self, _url: &str, _body: &[u8]) -> bool {
        false
    }

    fn user_agent(&self) -> Option<String> {
        None
    }

    fn page_url(&self) -> Option<String> {
        None
    }

    /// Reads a value from page-session storage.
    fn session_item(&self, _key: &str) -> Option<String> {
        None
    }

    /// Writes a value to page-session storage. Returns `false` when storage is
    /// unavailable.
    fn set_session_item(&self, _key: &str, _value: &str) -> bool {
        false
    }

    /// Registers a handler for page-hide and unload signals. Runtimes without
    /// a page lifecycle ignore the registration and return `None`.
    fn on_teardown(&self, _handler: TeardownHandler) -> Option<TeardownId> {
        None
    }

    /// Removes a handler returned by [`on_teardown`](RuntimeEnvironment::on_teardown).
    /// Unknown ids are ignored.
    fn remove_teardown(&self, _id: TeardownId) {}
}
