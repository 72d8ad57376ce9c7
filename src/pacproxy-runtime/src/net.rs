//! Network membership checks (`isInNet`, `isInNetEx`).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::debug;

use super::dns::{Resolver, ResolverBackend};
use super::host::{self, HostKind};
use super::{PacError, Result};

/// A network address together with its mask, both of the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSpec {
    network: IpAddr,
    mask: IpAddr,
}

impl NetworkSpec {
    /// Pair a network address with a mask. Families must agree.
    pub fn new(network: IpAddr, mask: IpAddr) -> Result<Self> {
        if network.is_ipv4() != mask.is_ipv4() {
            return Err(PacError::InvalidNetwork(format!(
                "address family of {network} does not match mask {mask}"
            )));
        }
        Ok(Self { network, mask })
    }

    /// Parse the legacy `isInNet` form: dotted-quad pattern and dotted-quad mask.
    ///
    /// The mask is applied bit-for-bit; non-contiguous masks are accepted.
    pub fn from_dotted(pattern: &str, mask: &str) -> Result<Self> {
        let network = parse_ipv4(pattern)?;
        let mask = parse_ipv4(mask)?;
        Self::new(IpAddr::V4(network), IpAddr::V4(mask))
    }

    /// Parse CIDR notation (`10.0.0.0/8`, `2001:db8::/32`).
    pub fn from_cidr(prefix: &str) -> Result<Self> {
        let (address, length) = prefix
            .trim()
            .split_once('/')
            .ok_or_else(|| PacError::InvalidNetwork(format!("missing prefix length: {prefix}")))?;

        let network = host::parse_ip(address)
            .ok_or_else(|| PacError::InvalidNetwork(format!("invalid network address: {prefix}")))?;

        let max_length = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        let length = parse_prefix_length(length, max_length)
            .ok_or_else(|| PacError::InvalidNetwork(format!("invalid prefix length: {prefix}")))?;

        let mask = match network {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::from(prefix_mask_u32(length))),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::from(prefix_mask_u128(length))),
        };
        Self::new(network, mask)
    }

    /// Mask in address form.
    pub fn mask(&self) -> IpAddr {
        self.mask
    }

    /// Check `(ip & mask) == (network & mask)`. Other families never match.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (ip, self.network, self.mask) {
            (IpAddr::V4(ip), IpAddr::V4(net), IpAddr::V4(mask)) => {
                masked_eq(&ip.octets(), &net.octets(), &mask.octets())
            }
            (IpAddr::V6(ip), IpAddr::V6(net), IpAddr::V6(mask)) => {
                masked_eq(&ip.octets(), &net.octets(), &mask.octets())
            }
            _ => false,
        }
    }
}

fn parse_ipv4(input: &str) -> Result<Ipv4Addr> {
    input
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| PacError::InvalidAddress(input.to_string()))
}

/// Decimal digits only, no sign, at most `max`.
fn parse_prefix_length(input: &str, max: u8) -> Option<u8> {
    if input.is_empty() || input.len() > 3 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse::<u8>().ok().filter(|length| *length <= max)
}

fn prefix_mask_u32(length: u8) -> u32 {
    if length == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(length))
    }
}

fn prefix_mask_u128(length: u8) -> u128 {
    if length == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(length))
    }
}

fn masked_eq(ip: &[u8], network: &[u8], mask: &[u8]) -> bool {
    ip.iter()
        .zip(network)
        .zip(mask)
        .all(|((ip, net), mask)| ip & mask == net & mask)
}

/// `isInNet(host, pattern, mask)`.
///
/// `host` may be an IPv4 literal or a hostname, which is resolved first.
/// Every failure (unresolvable host, malformed pattern or mask, IPv6 host)
/// yields `false`.
pub async fn is_in_net<B: ResolverBackend>(
    resolver: &Resolver<B>,
    host: &str,
    pattern: &str,
    mask: &str,
) -> bool {
    let spec = match NetworkSpec::from_dotted(pattern, mask) {
        Ok(spec) => spec,
        Err(e) => {
            debug!(pattern = %pattern, mask = %mask, error = %e, "isInNet: bad network");
            return false;
        }
    };

    let ip = match HostKind::classify(host) {
        HostKind::Ipv4(v4) => IpAddr::V4(v4),
        HostKind::Ipv6(_) | HostKind::Invalid => return false,
        HostKind::Hostname(name) => match resolver.lookup(&name).await {
            Ok(addrs) => match addrs.first() {
                Some(ip) => *ip,
                None => return false,
            },
            Err(e) => {
                debug!(host = %name, error = %e, "isInNet: host not resolvable");
                return false;
            }
        },
    };

    spec.contains(ip)
}

/// `isInNetEx(host, prefix)`.
///
/// `prefix` is CIDR notation of either family. `host` may be an IP literal or
/// a hostname; a hostname matches when any of its addresses is inside.
pub async fn is_in_net_ex<B: ResolverBackend>(
    resolver: &Resolver<B>,
    host: &str,
    prefix: &str,
) -> bool {
    let spec = match NetworkSpec::from_cidr(prefix) {
        Ok(spec) => spec,
        Err(e) => {
            debug!(prefix = %prefix, error = %e, "isInNetEx: bad prefix");
            return false;
        }
    };

    match HostKind::classify(host) {
        HostKind::Ipv4(v4) => spec.contains(IpAddr::V4(v4)),
        HostKind::Ipv6(v6) => spec.contains(IpAddr::V6(v6)),
        HostKind::Invalid => false,
        HostKind::Hostname(name) => match resolver.lookup(&name).await {
            Ok(addrs) => addrs.into_iter().any(|ip| spec.contains(ip)),
            Err(e) => {
                debug!(host = %name, error = %e, "isInNetEx: host not resolvable");
                false
            }
        },
    }
}
