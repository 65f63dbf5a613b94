// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client identity resolution from transport metadata.
//!
//! Priority: first hop of `X-Forwarded-For`, then `X-Real-IP`, then the host
//! part of the socket address. Header values are not validated as IP
//! addresses; whatever the proxy chain supplies becomes the key.

use axum::http::HeaderMap;
use std::net::SocketAddr;

pub const FORWARDED_FOR: &str = "x-forwarded-for";
pub const REAL_IP: &str = "x-real-ip";

/// Transport metadata an identity is derived from.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportMeta<'a> {
    pub forwarded_for: Option<&'a str>,
    pub real_ip: Option<&'a str>,
    pub remote_addr: &'a str,
}

/// Resolve the canonical identity string. Never fails.
pub fn resolve(meta: &TransportMeta<'_>) -> String {
    if let Some(chain) = meta.forwarded_for.filter(|v| !v.is_empty()) {
        let first = chain.split(',').next().unwrap_or(chain);
        return first.trim_matches(' ').to_string();
    }

    if let Some(ip) = meta.real_ip.filter(|v| !v.is_empty()) {
        return ip.to_string();
    }

    match split_host_port(meta.remote_addr) {
        Some((host, _)) => host.to_string(),
        None => meta.remote_addr.to_string(),
    }
}

/// Resolve from request headers and the peer address, if known.
pub fn resolve_headers(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let remote = remote.map(|addr| addr.to_string()).unwrap_or_default();

    resolve(&TransportMeta {
        forwarded_for: header(FORWARDED_FOR),
        real_ip: header(REAL_IP),
        remote_addr: &remote,
    })
}

/// Split `host:port` or `[v6-host]:port`.
fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        let port = tail.strip_prefix(':')?;
        if port.contains(':') {
            return None;
        }
        return Some((host, port));
    }

    let (host, port) = addr.rsplit_once(':')?;
    if host.contains(':') {
        // bare IPv6 without brackets is ambiguous
        return None;
    }
    Some((host, port))
}
