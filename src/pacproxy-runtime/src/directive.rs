//! Parsing of the `FindProxyForURL` result.
//!
//! A PAC script answers with a string such as `"PROXY a:8080; SOCKS b:1080; DIRECT"`.
//! [`ProxyDirective`] turns it into the ordered list a dispatcher walks through,
//! trying each choice until one connects.

use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

use tracing::warn;

use super::host::HostKind;
use super::{PacError, Result};

/// SOCKS protocol version requested by a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocksVersion {
    /// Plain `SOCKS`. Treated as SOCKS4 when a concrete version is needed,
    /// as browsers do.
    Unspecified,
    V4,
    V5,
}

impl SocksVersion {
    fn keyword(&self) -> &'static str {
        match self {
            SocksVersion::Unspecified => "SOCKS",
            SocksVersion::V4 => "SOCKS4",
            SocksVersion::V5 => "SOCKS5",
        }
    }
}

/// One entry of a proxy directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProxyChoice {
    /// Connect without a proxy.
    Direct,

    /// HTTP proxy.
    Proxy { host: String, port: u16 },

    /// SOCKS proxy.
    Socks {
        host: String,
        port: u16,
        version: SocksVersion,
    },
}

impl ProxyChoice {
    /// Parse a single entry such as `PROXY proxy.example.com:8080`.
    pub fn parse(entry: &str) -> Result<Self> {
        let entry = entry.trim();
        let (keyword, rest) = match entry.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (entry, ""),
        };

        let keyword = keyword.to_ascii_uppercase();
        if keyword == "DIRECT" {
            if !rest.is_empty() {
                return Err(PacError::InvalidDirective(format!(
                    "DIRECT takes no argument: {entry}"
                )));
            }
            return Ok(ProxyChoice::Direct);
        }

        let version = match keyword.as_str() {
            "PROXY" => None,
            "SOCKS" => Some(SocksVersion::Unspecified),
            "SOCKS4" => Some(SocksVersion::V4),
            "SOCKS5" => Some(SocksVersion::V5),
            _ => {
                return Err(PacError::InvalidDirective(format!(
                    "unknown keyword: {entry}"
                )));
            }
        };

        let (host, port) = parse_endpoint(rest)
            .ok_or_else(|| PacError::InvalidDirective(format!("bad host:port: {entry}")))?;

        Ok(match version {
            None => ProxyChoice::Proxy { host, port },
            Some(version) => ProxyChoice::Socks {
                host,
                port,
                version,
            },
        })
    }

    /// Check if this is `DIRECT`.
    pub fn is_direct(&self) -> bool {
        matches!(self, ProxyChoice::Direct)
    }

    /// Proxy host, without brackets. `None` for `DIRECT`.
    pub fn host(&self) -> Option<&str> {
        match self {
            ProxyChoice::Direct => None,
            ProxyChoice::Proxy { host, .. } | ProxyChoice::Socks { host, .. } => Some(host),
        }
    }

    /// Proxy port. `None` for `DIRECT`.
    pub fn port(&self) -> Option<u16> {
        match self {
            ProxyChoice::Direct => None,
            ProxyChoice::Proxy { port, .. } | ProxyChoice::Socks { port, .. } => Some(*port),
        }
    }

    /// Render as a URI for dispatchers (`http://h:p`, `socks4://h:p`, `direct://`).
    ///
    /// Plain `SOCKS` maps to `socks4://`.
    pub fn to_uri(&self) -> String {
        match self {
            ProxyChoice::Direct => "direct://".to_string(),
            ProxyChoice::Proxy { host, port } => format!("http://{}", authority(host, *port)),
            ProxyChoice::Socks {
                host,
                port,
                version: SocksVersion::V5,
            } => format!("socks5://{}", authority(host, *port)),
            ProxyChoice::Socks { host, port, .. } => {
                format!("socks4://{}", authority(host, *port))
            }
        }
    }
}

impl fmt::Display for ProxyChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyChoice::Direct => f.write_str("DIRECT"),
            ProxyChoice::Proxy { host, port } => write!(f, "PROXY {}", authority(host, *port)),
            ProxyChoice::Socks {
                host,
                port,
                version,
            } => write!(f, "{} {}", version.keyword(), authority(host, *port)),
        }
    }
}

fn authority(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Split `host:port` or `[v6]:port` and validate both halves.
fn parse_endpoint(input: &str) -> Option<(String, u16)> {
    if input.is_empty() || input.contains(char::is_whitespace) {
        return None;
    }

    let (host, port) = if let Some(rest) = input.strip_prefix('[') {
        let (v6, port) = rest.split_once("]:")?;
        let v6: Ipv6Addr = v6.parse().ok()?;
        (v6.to_string(), port)
    } else {
        let (host, port) = input.rsplit_once(':')?;
        if host.contains(':') {
            // Unbracketed IPv6 is ambiguous with the port separator.
            return None;
        }
        match HostKind::classify(host) {
            HostKind::Invalid | HostKind::Ipv6(_) => return None,
            HostKind::Ipv4(v4) => (v4.to_string(), port),
            HostKind::Hostname(name) => (name, port),
        }
    };

    Some((host, parse_port(port)?))
}

fn parse_port(input: &str) -> Option<u16> {
    if input.is_empty() || input.len() > 5 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse::<u16>().ok().filter(|port| *port != 0)
}

/// Ordered, non-empty list of proxy choices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyDirective {
    choices: Vec<ProxyChoice>,
}

impl ProxyDirective {
    /// The fail-open directive, `DIRECT`.
    pub fn direct() -> Self {
        Self {
            choices: vec![ProxyChoice::Direct],
        }
    }

    /// Parse a script result.
    ///
    /// Empty entries are skipped. Parsing stops at the first invalid entry,
    /// keeping what came before it. When nothing valid remains the result is
    /// `DIRECT`.
    pub fn parse(input: &str) -> Self {
        let mut choices = Vec::new();
        for entry in input.split(';') {
            if entry.trim().is_empty() {
                continue;
            }
            match ProxyChoice::parse(entry) {
                Ok(choice) => choices.push(choice),
                Err(e) => {
                    warn!(directive = %input, error = %e, "Discarding rest of proxy directive");
                    break;
                }
            }
        }

        if choices.is_empty() {
            return Self::direct();
        }
        Self { choices }
    }

    /// All choices, in preference order.
    pub fn choices(&self) -> &[ProxyChoice] {
        &self.choices
    }

    /// Most preferred choice.
    pub fn first(&self) -> &ProxyChoice {
        // Non-empty by construction.
        &self.choices[0]
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProxyChoice> {
        self.choices.iter()
    }

    pub fn into_vec(self) -> Vec<ProxyChoice> {
        self.choices
    }
}

impl Default for ProxyDirective {
    fn default() -> Self {
        Self::direct()
    }
}

impl fmt::Display for ProxyDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, choice) in self.choices.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{choice}")?;
        }
        Ok(())
    }
}

impl FromStr for ProxyDirective {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl<'a> IntoIterator for &'a ProxyDirective {
    type Item = &'a ProxyChoice;
    type IntoIter = std::slice::Iter<'a, ProxyChoice>;

    fn into_iter(self) -> Self::IntoIter {
        self.choices.iter()
    }
}
