//! The PAC function library.
//!
//! [`PacFunctions`] is the capability a script host binds into the script's
//! global namespace; [`PacLibrary`] implements it on top of the matchers and
//! the [`Resolver`]. Nothing here fails: every function returns the value
//! scripts expect when the answer is unknown.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::config::PacConfig;
use super::dns::{self, CachingBackend, Resolver, ResolverBackend, SystemBackend};
use super::{Result, domain, net, pattern};

/// Functions available to PAC scripts, one method per script function.
#[async_trait]
pub trait PacFunctions: Send + Sync {
    /// `dnsDomainIs(host, domain)`
    fn dns_domain_is(&self, host: &str, domain: &str) -> bool;

    /// `dnsDomainLevels(host)`
    fn dns_domain_levels(&self, host: &str) -> usize;

    /// `dnsResolve(host)`
    async fn dns_resolve(&self, host: &str) -> Option<String>;

    /// `isPlainHostName(host)`
    fn is_plain_host_name(&self, host: &str) -> bool;

    /// `isResolvable(host)`
    async fn is_resolvable(&self, host: &str) -> bool;

    /// `isInNet(host, pattern, mask)`
    async fn is_in_net(&self, host: &str, pattern: &str, mask: &str) -> bool;

    /// `localHostOrDomainIs(host, hostdom)`
    fn local_host_or_domain_is(&self, host: &str, hostdom: &str) -> bool;

    /// `myIpAddress()`
    async fn my_ip_address(&self) -> String;

    /// `shExpMatch(str, shexp)`
    fn sh_exp_match(&self, subject: &str, pattern: &str) -> bool;

    /// `log(message)`
    fn log(&self, message: &str);

    /// `isResolvableEx(host)`
    async fn is_resolvable_ex(&self, host: &str) -> bool;

    /// `isInNetEx(host, prefix)`
    async fn is_in_net_ex(&self, host: &str, prefix: &str) -> bool;

    /// `dnsResolveEx(host)`
    async fn dns_resolve_ex(&self, host: &str) -> String;

    /// `myIpAddressEx()`
    async fn my_ip_address_ex(&self) -> String;

    /// `sortIpAddressList(list)`
    fn sort_ip_address_list(&self, list: &str) -> String;

    /// `getClientVersion()`
    fn get_client_version(&self) -> String;
}

/// Type-erased backend, used when the backend is picked from config.
pub type SharedBackend = Arc<dyn ResolverBackend>;

/// The standard PAC function library.
pub struct PacLibrary<B> {
    resolver: Resolver<B>,
    client_version: String,
}

impl<B: ResolverBackend> PacLibrary<B> {
    /// Create a library over a backend.
    pub fn new(backend: B, config: &PacConfig) -> Self {
        Self {
            resolver: Resolver::new(backend, config),
            client_version: config.client_version.clone(),
        }
    }

    /// The resolver used by the DNS functions.
    pub fn resolver(&self) -> &Resolver<B> {
        &self.resolver
    }
}

impl PacLibrary<SharedBackend> {
    /// Create a library over the system resolver, cached when configured.
    pub fn system(config: &PacConfig) -> Result<Self> {
        config.validate()?;

        let backend: SharedBackend = if config.cache.enabled {
            Arc::new(CachingBackend::from_config(SystemBackend, &config.cache))
        } else {
            Arc::new(SystemBackend)
        };
        Ok(Self::new(backend, config))
    }
}

#[async_trait]
impl<B: ResolverBackend> PacFunctions for PacLibrary<B> {
    fn dns_domain_is(&self, host: &str, domain: &str) -> bool {
        domain::dns_domain_is(host, domain)
    }

    fn dns_domain_levels(&self, host: &str) -> usize {
        domain::dns_domain_levels(host)
    }

    async fn dns_resolve(&self, host: &str) -> Option<String> {
        self.resolver.dns_resolve(host).await
    }

    fn is_plain_host_name(&self, host: &str) -> bool {
        domain::is_plain_host_name(host)
    }

    async fn is_resolvable(&self, host: &str) -> bool {
        self.resolver.is_resolvable(host).await
    }

    async fn is_in_net(&self, host: &str, pattern: &str, mask: &str) -> bool {
        net::is_in_net(&self.resolver, host, pattern, mask).await
    }

    fn local_host_or_domain_is(&self, host: &str, hostdom: &str) -> bool {
        domain::local_host_or_domain_is(host, hostdom)
    }

    async fn my_ip_address(&self) -> String {
        self.resolver.my_ip_address().await
    }

    fn sh_exp_match(&self, subject: &str, pattern: &str) -> bool {
        pattern::sh_exp_match(subject, pattern)
    }

    fn log(&self, message: &str) {
        info!(target: "pac_script", "{}", message);
    }

    async fn is_resolvable_ex(&self, host: &str) -> bool {
        self.resolver.is_resolvable_ex(host).await
    }

    async fn is_in_net_ex(&self, host: &str, prefix: &str) -> bool {
        net::is_in_net_ex(&self.resolver, host, prefix).await
    }

    async fn dns_resolve_ex(&self, host: &str) -> String {
        self.resolver.dns_resolve_ex(host).await
    }

    async fn my_ip_address_ex(&self) -> String {
        self.resolver.my_ip_address_ex().await
    }

    fn sort_ip_address_list(&self, list: &str) -> String {
        dns::sort_ip_address_list(list)
    }

    fn get_client_version(&self) -> String {
        self.client_version.clone()
    }
}
