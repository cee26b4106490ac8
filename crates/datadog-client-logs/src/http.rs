// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client construction for the network delivery path.

use tracing::error;

use crate::config::Config;
use crate::logs::constants::{POOL_IDLE_TIMEOUT, TCP_KEEPALIVE};

/// Creates the client used by [`HttpTransport`](crate::logs::transport::HttpTransport).
///
/// Requests time out after `flush_timeout`; idle pooled connections are kept
/// alive so deliveries right before teardown reuse a warm connection.
///
/// Falls back to reqwest defaults if the configured client cannot be built.
#[must_use]
pub fn get_client(config: &Config) -> reqwest::Client {
    match build_client(config) {
        Ok(client) => client,
        Err(e) => {
            error!(
                "HTTP | Unable to build HTTP client: {}, using reqwest defaults",
                e
            );
            reqwest::Client::new()
        }
    }
}

fn build_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(config.flush_timeout)
        .pool_idle_timeout(Some(POOL_IDLE_TIMEOUT))
        .tcp_keepalive(Some(TCP_KEEPALIVE))
        .build()
}
