//! Address parsing for peer addresses and provider headers.
//!
//! Both helpers accept the loose forms edge networks and socket layers emit:
//! `1.2.3.4`, `1.2.3.4:80`, `::1`, `[::1]`, `[::1]:80`.

use std::net::IpAddr;

/// Split `host:port` the way socket addresses are written.
///
/// `[v6]:port` and `v4:port` split; a bare IPv6 address (more than one colon,
/// no brackets) does not. The port is not validated.
pub fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let end = rest.find(']')?;
        let host = &rest[..end];
        let port = rest[end + 1..].strip_prefix(':')?;
        return Some((host, port));
    }

    let (host, port) = addr.rsplit_once(':')?;
    if host.contains(':') || host.contains('[') || host.contains(']') {
        return None;
    }
    Some((host, port))
}

/// Host part of a transport peer address, or the whole string when it has no port.
pub fn peer_host(peer: &str) -> &str {
    match split_host_port(peer) {
        Some((host, _)) if !host.is_empty() => host,
        _ => peer,
    }
}

/// Normalise a provider header value to a client IP.
///
/// Order matters: a bare IPv6 literal has to be accepted whole before any
/// attempt to treat its last group as a port.
pub fn extract_client_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some((host, _)) = split_host_port(raw) {
        if !host.is_empty() {
            return host.parse().ok();
        }
    }

    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        return inner.parse().ok();
    }

    if let Ok(ip) = raw.parse() {
        return Some(ip);
    }

    // Unbracketed IPv6 with a port, e.g. "2001:db8::1:8443".
    let (host, port) = raw.rsplit_once(':')?;
    if host.is_empty() || port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    host.parse().ok()
}
