// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Correlation identifier resolution.
//!
//! Every log event carries an identifier tying it to the request or page
//! session that produced it. Resolution order, evaluated on every call:
//!
//! 1. The carrier cookie set upstream (re-read each time, never cached)
//! 2. The id minted earlier in this session (in memory, then session storage)
//! 3. A fresh UUID v4, cached and written to session storage
//!
//! Non-browser runtimes resolve to `None`; request correlation there belongs
//! to the server-side request handling.

use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

use crate::lock;
use crate::runtime::RuntimeEnvironment;

pub mod carrier;

use carrier::{CookieJar, Extractor};

/// Cookie holding the upstream-assigned correlation id.
pub const CORRELATION_COOKIE: &str = "correlation_id";

/// Session storage key for the minted correlation id.
pub const SESSION_STORAGE_KEY: &str = "correlation_id";

pub struct CorrelationIdProvider {
    runtime: Arc<dyn RuntimeEnvironment>,
    minted: Mutex<Option<String>>,
}

impl CorrelationIdProvider {
    #[must_use]
    pub fn new(runtime: Arc<dyn RuntimeEnvironment>) -> Self {
        Self {
            runtime,
            minted: Mutex::new(None),
        }
    }

    /// Resolves the correlation id for the current context.
    ///
    /// Always `Some` with a non-empty value in a browser-like runtime.
    #[must_use]
    pub fn resolve(&self) -> Option<String> {
        if !self.runtime.is_browser() {
            return None;
        }
        if let Some(carried) = self.carrier_value() {
            return Some(carried);
        }
        Some(self.session_id())
    }

    /// The id minted for this session, minting it on first use.
    fn session_id(&self) -> String {
        let mut minted = lock(&self.minted);
        if let Some(id) = minted.as_ref() {
            return id.clone();
        }

        let id = match self
            .runtime
            .session_item(SESSION_STORAGE_KEY)
            .filter(|stored| !stored.trim().is_empty())
        {
            Some(stored) => stored,
            None => {
                let id = Uuid::new_v4().to_string();
                if !self.runtime.set_session_item(SESSION_STORAGE_KEY, &id) {
                    debug!("CORRELATION | Session storage unavailable, correlation id kept in memory");
                }
                id
            }
        };
        *minted = Some(id.clone());
        id
    }

    fn carrier_value(&self) -> Option<String> {
        let header = self.runtime.cookie_header()?;
        CookieJar::parse(&header)
            .get(CORRELATION_COOKIE)
            .map(str::to_string)
    }
}

impl std::fmt::Debug for CorrelationIdProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationIdProvider")
            .field("browser", &self.runtime.is_browser())
            .field("minted", &*lock(&self.minted))
            .finish()
    }
}
