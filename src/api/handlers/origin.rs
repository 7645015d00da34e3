//! Client address resolution.
//!
//! Forwarding headers are client-controlled, so they are only honoured when
//! the service is configured to run behind a trusted proxy.

use axum::http::HeaderMap;
use std::net::SocketAddr;

pub const UNKNOWN_ORIGIN: &str = "unknown";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OriginResolver {
    trust_forwarded_for: bool,
}

impl OriginResolver {
    #[must_use]
    pub fn new(trust_forwarded_for: bool) -> Self {
        Self {
            trust_forwarded_for,
        }
    }

    #[must_use]
    pub fn trusts_forwarded_for(&self) -> bool {
        self.trust_forwarded_for
    }

    /// Origin address used as the block and throttle key.
    #[must_use]
    pub fn resolve(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        if self.trust_forwarded_for {
            if let Some(forwarded) = extract_client_ip(headers) {
                return forwarded;
            }
        }
        peer.map_or_else(|| UNKNOWN_ORIGIN.to_string(), |addr| addr.ip().to_string())
    }
}

/// First `X-Forwarded-For` entry, falling back to `X-Real-IP`.
fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
