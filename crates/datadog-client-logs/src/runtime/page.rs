// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Browser-like page runtime.
//!
//! The embedding host (a webview shell, an in-app browser bridge, a test)
//! builds a [`PageRuntime`] with whatever the page exposes and keeps it up to
//! date: refreshed cookies through [`PageRuntime::set_cookie_header`] and
//! page-hide/unload through [`PageRuntime::dispatch`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::lock;
use crate::runtime::{LifecycleSignal, RuntimeEnvironment, TeardownHandler, TeardownId};

/// Lifecycle-safe delivery primitive: `(url, body) -> accepted`.
pub type BeaconFn = Arc<dyn Fn(&str, &[u8]) -> bool + Send + Sync>;

type SharedHandler = Arc<dyn Fn(LifecycleSignal) + Send + Sync>;

#[derive(Default)]
struct Handlers {
    next_id: u64,
    registered: Vec<(TeardownId, SharedHandler)>,
}

#[derive(Default)]
pub struct PageRuntimeBuilder {
    cookie_header: Option<String>,
    user_agent: Option<String>,
    page_url: Option<String>,
    beacon: Option<BeaconFn>,
    session_storage: bool,
}

impl PageRuntimeBuilder {
    #[must_use]
    pub fn cookie_header(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = Some(url.into());
        self
    }

    /// Enables the lifecycle-safe delivery primitive.
    #[must_use]
    pub fn beacon<F>(mut self, beacon: F) -> Self
    where
        F: Fn(&str, &[u8]) -> bool + Send + Sync + 'static,
    {
        self.beacon = Some(Arc::new(beacon));
        self
    }

    /// Enables page-session storage. Enabled by default.
    #[must_use]
    pub fn session_storage(mut self, enabled: bool) -> Self {
        self.session_storage = enabled;
        self
    }

    #[must_use]
    pub fn build(self) -> PageRuntime {
        PageRuntime {
            cookie_header: Mutex::new(self.cookie_header),
            user_agent: self.user_agent,
            page_url: self.page_url,
            beacon: self.beacon,
            session: self.session_storage.then(|| Mutex::new(HashMap::new())),
            handlers: Mutex::new(Handlers::default()),
        }
    }
}

/// Interactive page hosted by an embedder.
pub struct PageRuntime {
    cookie_header: Mutex<Option<String>>,
    user_agent: Option<String>,
    page_url: Option<String>,
    beacon: Option<BeaconFn>,
    session: Option<Mutex<HashMap<String, String>>>,
    handlers: Mutex<Handlers>,
}

impl PageRuntime {
    #[must_use]
    pub fn builder() -> PageRuntimeBuilder {
        PageRuntimeBuilder {
            session_storage: true,
            ..PageRuntimeBuilder::default()
        }
    }

    /// Replaces the cookies visible to the page, e.g. after an upstream
    /// component refreshed the correlation carrier.
    pub fn set_cookie_header(&self, header: Option<String>) {
        *lock(&self.cookie_header) = header;
    }

    /// Delivers a lifecycle signal to every registered teardown handler.
    pub fn dispatch(&self, signal: LifecycleSignal) {
        let handlers: Vec<SharedHandler> = lock(&self.handlers)
            .registered
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        debug!(
            "RUNTIME | Dispatching {} to {} teardown handler(s)",
            signal,
            handlers.len()
        );
        for handler in handlers {
            handler(signal);
        }
    }

    #[must_use]
    pub fn teardown_handler_count(&self) -> usize {
        lock(&self.handlers).registered.len()
    }
}

impl Default for PageRuntime {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for PageRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRuntime")
            .field("user_agent", &self.user_agent)
            .field("page_url", &self.page_url)
            .field("has_beacon", &self.beacon.is_some())
            .field("session_storage", &self.session.is_some())
            .field("teardown_handlers", &self.teardown_handler_count())
            .finish_non_exhaustive()
    }
}

impl RuntimeEnvironment for PageRuntime {
    fn is_browser(&self) -> bool {
        true
    }

    fn cookie_header(&self) -> Option<String> {
        lock(&self.cookie_header).clone()
    }

    fn has_beacon(&self) -> bool {
        self.beacon.is_some()
    }

    fn send_beacon(&self, url: &str, body: &[u8]) -> bool {
        match &self.beacon {
            Some(beacon) => beacon(url, body),
            None => false,
        }
    }

    fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }

    fn page_url(&self) -> Option<String> {
        self.page_url.clone()
    }

    fn session_item(&self, key: &str) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|session| lock(session).get(key).cloned())
    }

    fn set_session_item(&self, key: &str, value: &str) -> bool {
        match &self.session {
            Some(session) => {
                lock(session).insert(key.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    fn on_teardown(&self, handler: TeardownHandler) -> Option<TeardownId> {
        let mut handlers = lock(&self.handlers);
        handlers.next_id += 1;
        let id = TeardownId::new(handlers.next_id);
        handlers.registered.push((id, Arc::from(handler)));
        Some(id)
    }

    fn remove_teardown(&self, id: TeardownId) {
        lock(&self.handlers)
            .registered
            .retain(|(registered, _)| *registered != id);
    }
}
