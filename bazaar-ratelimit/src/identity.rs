//! Client identity derivation.
//!
//! Both stores partition on a per-request identity string. The
//! identity is the first `X-Forwarded-For` entry when a proxy supplied
//! one, else the direct connection address, else `"unknown"`. It is
//! recomputed per request and never persisted.

use std::net::IpAddr;

/// Network-origin facts about an inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    /// Direct connection address
    pub peer: Option<IpAddr>,
    /// Request headers as name/value pairs
    pub headers: Vec<(String, String)>,
}

impl RequestInfo {
    /// Create an empty request info.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection address.
    pub fn with_peer(mut self, peer: IpAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Get a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        let name_lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| n.to_lowercase() == name_lower)
            .map(|(_, v)| v.as_str())
    }
}

/// Derive the partition key for quota accounting.
pub fn client_identity(info: &RequestInfo) -> String {
    if let Some(forwarded) = info.get_header("x-forwarded-for") {
        if let Some(first) = forwarded
            .split(',')
            .map(str::trim)
            .find(|entry| !entry.is_empty())
        {
            return first.to_string();
        }
    }

    match info.peer {
        Some(ip) => ip.to_string(),
        None => "unknown".to_string(),
    }
}
