// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::runtime::RuntimeEnvironment;

/// Non-interactive process runtime.
///
/// No carrier, no beacon, no session storage and no page lifecycle: log calls
/// only reach the console sink, and correlation is left to server-side
/// request handling.
#[derive(Debug, Default, Copy, Clone)]
pub struct ServerRuntime;

impl RuntimeEnvironment for ServerRuntime {
    fn is_browser(&self) -> bool {
        false
    }
}
