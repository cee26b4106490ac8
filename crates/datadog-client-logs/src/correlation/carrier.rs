// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Carrier parsing for upstream-assigned correlation identifiers.
//!
//! An upstream component (edge middleware, the serving backend) may set a
//! cookie holding the correlation id for the current request. The page sees
//! it as part of its `Cookie` header; [`CookieJar`] turns that header into a
//! case-insensitive [`Extractor`].
//!
//! Parsing never fails. Malformed pairs are skipped, so a broken carrier
//! looks exactly like an absent one.

use std::collections::HashMap;

/// Read access to a key/value carrier.
pub trait Extractor {
    /// Gets a value by key, case-insensitively.
    fn get(&self, key: &str) -> Option<&str>;

    /// All keys present in the carrier, lower-cased.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<&str> {
        self.get(&key.to_lowercase()).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect::<Vec<_>>()
    }
}

/// Well-formed cookies parsed from a `Cookie` header.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    /// Parses `name=value` pairs separated by `;`.
    ///
    /// When a name appears more than once the first occurrence wins, matching
    /// the most-specific-path-first order browsers send cookies in.
    ///
    /// ```
    /// use datadog_client_logs::correlation::carrier::{CookieJar, Extractor};
    ///
    /// let jar = CookieJar::parse("theme=dark; Correlation_Id=\"4f1c\"; broken");
    /// assert_eq!(jar.get("correlation_id"), Some("4f1c"));
    /// assert_eq!(jar.get("broken"), None);
    /// ```
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let mut cookies = HashMap::new();
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let Some(value) = parse_value(value) else {
                continue;
            };
            cookies
                .entry(name.to_lowercase())
                .or_insert_with(|| value.to_string());
        }
        Self { cookies }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl Extractor for CookieJar {
    fn get(&self, key: &str) -> Option<&str> {
        self.cookies.get(&key.to_lowercase()).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.cookies.keys().map(String::as_str).collect::<Vec<_>>()
    }
}

/// Returns the cookie value with optional surrounding quotes removed, or
/// `None` when the value is empty or not a valid cookie octet sequence.
fn parse_value(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    let value = match raw.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"')?,
        None => raw,
    };
    if value.is_empty() || !value.chars().all(is_cookie_octet) {
        return None;
    }
    Some(value)
}

fn is_cookie_octet(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, '"' | ',' | ';' | '\\')
}
