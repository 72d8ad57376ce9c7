//! Host literal classification.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Maximum length of a DNS name in text form, without the trailing dot.
const MAX_NAME_LEN: usize = 253;

/// Maximum length of a single DNS label.
const MAX_LABEL_LEN: usize = 63;

/// What a host literal supplied by a script turned out to be.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HostKind {
    /// Dotted-quad IPv4 address.
    Ipv4(Ipv4Addr),

    /// IPv6 address, bracketed or not.
    Ipv6(Ipv6Addr),

    /// Syntactically valid hostname, lowercased.
    Hostname(String),

    /// Anything else. Never handed to a resolver.
    Invalid,
}

impl HostKind {
    /// Classify a host literal.
    pub fn classify(input: &str) -> Self {
        let literal = strip_brackets(input.trim());
        let literal = strip_zone_id(literal);

        if let Ok(v4) = literal.parse::<Ipv4Addr>() {
            return HostKind::Ipv4(v4);
        }
        if let Ok(v6) = literal.parse::<Ipv6Addr>() {
            return HostKind::Ipv6(v6);
        }

        let name = input.trim();
        if is_valid_hostname(name) {
            HostKind::Hostname(normalize_hostname(name))
        } else {
            HostKind::Invalid
        }
    }

    /// The address, when the literal is an IP address.
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            HostKind::Ipv4(v4) => Some(IpAddr::V4(*v4)),
            HostKind::Ipv6(v6) => Some(IpAddr::V6(*v6)),
            _ => None,
        }
    }
}

/// Parse an IP literal of either family, accepting IPv6 brackets and zone ids.
pub fn parse_ip(input: &str) -> Option<IpAddr> {
    HostKind::classify(input).ip()
}

/// Strip one pair of IPv6 brackets.
fn strip_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(host)
}

/// Strip an IPv6 zone id ("fe80::1%eth0").
fn strip_zone_id(host: &str) -> &str {
    if host.contains(':') {
        host.split_once('%').map(|(ip, _)| ip).unwrap_or(host)
    } else {
        host
    }
}

/// Lowercase and drop the trailing root dot.
fn normalize_hostname(host: &str) -> String {
    host.strip_suffix('.').unwrap_or(host).to_ascii_lowercase()
}

/// Check hostname syntax: labels of letters, digits, '-' and '_'.
fn is_valid_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > MAX_NAME_LEN {
        return false;
    }

    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    })
}
