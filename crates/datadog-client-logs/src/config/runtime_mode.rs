// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Runtime mode (developer vs. production build).
//!
//! The mode only changes diagnostic verbosity: in `Development`, dropped
//! batches and facade failures are surfaced as `warn!` diagnostics; in
//! `Production` they are `debug!`. Delivery behaviour is identical.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeMode {
    /// Developer build: diagnostics are loud.
    Development,
    /// Production build: diagnostics are quiet. This is the default.
    #[default]
    Production,
}

impl RuntimeMode {
    /// Returns true if developer-only diagnostics should be emitted.
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Parses a runtime mode from an environment variable value.
    ///
    /// Accepts: "development", "production"
    /// Aliases: "dev", "local", "prod"
    #[must_use]
    pub fn from_env_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}
