//! PAC (Proxy Auto-Configuration) function library and evaluation runtime.
//!
//! This crate implements the host side of PAC evaluation:
//! - The classic PAC helper functions (`shExpMatch`, `isInNet`, `dnsDomainIs`, ...)
//! - The IPv6 extension functions (`isInNetEx`, `dnsResolveEx`, `sortIpAddressList`, ...)
//! - Resolution policy (timeouts, bounded concurrency) over a pluggable backend
//! - Parsing of the `FindProxyForURL` result into an ordered proxy list
//!
//! Executing the PAC script text is left to a [`ScriptHost`] implementation
//! supplied by the embedder.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PacEvaluator                              │
//! │   ScriptHost ──calls──► FindProxyForURL(url, host)          │
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │              PacLibrary (PacFunctions)                   ││
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────────────┐  ││
//! │  │  │ pattern  │ │   net    │ │  domain  │ │  Resolver  │  ││
//! │  │  └──────────┘ └──────────┘ └──────────┘ └─────┬──────┘  ││
//! │  └───────────────────────────────────────────────┼─────────┘│
//! │                                        ResolverBackend       │
//! │  result string ──► ProxyDirective [PROXY a:1, DIRECT]        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use pacproxy_runtime::{PacConfig, PacFunctions, PacLibrary, ProxyDirective};
//!
//! let library = PacLibrary::system(&PacConfig::default())?;
//!
//! assert!(library.sh_exp_match("www.example.com", "*.example.com"));
//! assert!(library.is_in_net("10.2.3.4", "10.2.3.0", "255.255.255.0").await);
//!
//! let directive: ProxyDirective = "PROXY 10.0.0.1:8080; DIRECT".parse()?;
//! assert_eq!(directive.len(), 2);
//! ```

pub mod binding;
pub mod config;
pub mod directive;
pub mod dns;
pub mod domain;
pub mod evaluator;
pub mod host;
pub mod library;
pub mod net;
pub mod pattern;

pub use binding::{PacFunction, ScriptValue, invoke};
pub use config::{CacheConfig, PacConfig, PacConfigBuilder};
pub use directive::{ProxyChoice, ProxyDirective, SocksVersion};
pub use dns::{CachingBackend, Resolver, ResolverBackend, StaticBackend, SystemBackend};
pub use evaluator::{EntryPoint, PacEvaluator, ScriptHost};
pub use host::HostKind;
pub use library::{PacFunctions, PacLibrary};
pub use net::NetworkSpec;
pub use pattern::ShellPattern;

use thiserror::Error;

/// Errors raised inside the runtime.
///
/// None of these reach a PAC script: the script-facing functions turn them
/// into the documented sentinel values and report them through `tracing`.
#[derive(Debug, Error)]
pub enum PacError {
    /// Malformed IP address literal.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Malformed network, mask or CIDR literal.
    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    /// Malformed proxy directive entry.
    #[error("Invalid proxy directive: {0}")]
    InvalidDirective(String),

    /// Name resolution failed.
    #[error("DNS resolution error: {0}")]
    Resolution(String),

    /// Name resolution did not finish in time.
    #[error("DNS resolution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// No usable local address was found.
    #[error("No local address found")]
    NoLocalAddress,

    /// Script argument could not be coerced.
    #[error("Cannot coerce {0} argument to a string")]
    Coercion(&'static str),

    /// The script host failed to run an entry point.
    #[error("Script error: {0}")]
    Script(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PacError>;
