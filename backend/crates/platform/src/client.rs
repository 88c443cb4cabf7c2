//! Client identification utilities
//!
//! Resolves the network address a request is attributed to. The address is
//! the key of rate limit counters and vote/report dedup guards, so it must be
//! derived the same way on every endpoint.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Sentinel used when no address can be parsed from the request
pub const UNDEFINED_IP: &str = "undefined-ip";

/// Header set by reverse proxies with the original client chain
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Header set by reverse proxies with the original client address
pub const REAL_IP: &str = "x-real-ip";

/// Resolve the client address of a request
///
/// Priority:
/// 1. first parseable entry of `X-Forwarded-For`
/// 2. `X-Real-IP`
/// 3. the transport peer address
///
/// Falls back to [`UNDEFINED_IP`] when none of them parse.
pub fn resolve_client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    extract_client_ip(headers, peer.map(|addr| addr.ip()))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNDEFINED_IP.to_string())
}

/// Extract client IP address from headers
///
/// Every comma-separated entry of `X-Forwarded-For` is tried in order, so a
/// garbage first hop does not hide a valid second one.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = header_str(headers, FORWARDED_FOR) {
        if let Some(ip) = xff.split(',').find_map(|entry| entry.trim().parse::<IpAddr>().ok()) {
            return Some(ip);
        }
    }

    if let Some(ip) = header_str(headers, REAL_IP).and_then(|v| v.trim().parse::<IpAddr>().ok()) {
        return Some(ip);
    }

    direct_ip
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
