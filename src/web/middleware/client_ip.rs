//! Client IP resolution from trusted proxy headers.
//!
//! Priority: `X-Real-IP` (set by the gateway) -> rightmost `X-Forwarded-For`
//! (appended by the last proxy hop) -> socket peer address.

use axum::extract::ConnectInfo;
use http::{Extensions, HeaderMap};
use std::net::{IpAddr, SocketAddr};

pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Resolve the client address, or `None` when neither headers nor the socket say.
pub fn resolve_client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    if let Some(ip) = header_str(headers, "x-real-ip").and_then(|s| s.trim().parse().ok()) {
        return Some(ip);
    }

    if let Some(xff) = header_str(headers, "x-forwarded-for")
        && let Some(ip) = xff
            .rsplit(',')
            .next()
            .map(str::trim)
            .and_then(|s| s.parse().ok())
    {
        return Some(ip);
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}
