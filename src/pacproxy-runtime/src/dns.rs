//! Name resolution and local address discovery.
//!
//! [`Resolver`] wraps a [`ResolverBackend`] with the PAC failure policy:
//! - IP literals never reach the backend, malformed names never either
//! - every backend call is bounded by the configured timeout
//! - at most `max_concurrent_lookups` backend calls run at once
//! - failures turn into `null` / `false` / `""` at the script boundary
//!
//! Backend calls run as their own tasks and hold a concurrency permit until
//! they finish. A caller that times out or is dropped stops waiting, but the
//! permit is only returned once the backend work is actually done.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::config::{CacheConfig, PacConfig};
use super::host::{self, HostKind};
use super::{PacError, Result};

/// Address returned by `myIpAddress()` when nothing better is found.
const FALLBACK_ADDRESS: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Source of name resolution and local interface data.
#[async_trait]
pub trait ResolverBackend: Send + Sync + 'static {
    /// Resolve a hostname. An empty list is a valid (unsuccessful) answer.
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;

    /// Enumerate addresses assigned to local interfaces.
    async fn local_addresses(&self) -> io::Result<Vec<IpAddr>>;

    /// Name of the local machine, if known.
    fn local_host_name(&self) -> Option<String> {
        None
    }
}

#[async_trait]
impl<B: ResolverBackend + ?Sized> ResolverBackend for Arc<B> {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        (**self).lookup(host).await
    }

    async fn local_addresses(&self) -> io::Result<Vec<IpAddr>> {
        (**self).local_addresses().await
    }

    fn local_host_name(&self) -> Option<String> {
        (**self).local_host_name()
    }
}

/// Backend using the operating system resolver and interface table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBackend;

#[async_trait]
impl ResolverBackend for SystemBackend {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|socket_addr| socket_addr.ip()).collect())
    }

    async fn local_addresses(&self) -> io::Result<Vec<IpAddr>> {
        let interfaces = tokio::task::spawn_blocking(if_addrs::get_if_addrs)
            .await
            .map_err(io::Error::other)??;
        Ok(interfaces.iter().map(|iface| iface.ip()).collect())
    }

    fn local_host_name(&self) -> Option<String> {
        hostname::get().ok().and_then(|name| name.into_string().ok())
    }
}

/// Backend answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticBackend {
    hosts: HashMap<String, Vec<IpAddr>>,
    local_addresses: Vec<IpAddr>,
    host_name: Option<String>,
}

impl StaticBackend {
    /// Create an empty table: every lookup fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host entry. Names are matched case-insensitively.
    pub fn with_host(mut self, name: &str, addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        self.hosts
            .insert(name.to_ascii_lowercase(), addrs.into_iter().collect());
        self
    }

    /// Set the local interface addresses.
    pub fn with_local_addresses(mut self, addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        self.local_addresses = addrs.into_iter().collect();
        self
    }

    /// Set the local host name.
    pub fn with_host_name(mut self, name: impl Into<String>) -> Self {
        self.host_name = Some(name.into());
        self
    }
}

#[async_trait]
impl ResolverBackend for StaticBackend {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.hosts
            .get(&host.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("unknown host {host}")))
    }

    async fn local_addresses(&self) -> io::Result<Vec<IpAddr>> {
        Ok(self.local_addresses.clone())
    }

    fn local_host_name(&self) -> Option<String> {
        self.host_name.clone()
    }
}

struct CacheEntry {
    addrs: Vec<IpAddr>,
    expires_at: Instant,
}

/// Backend wrapper caching positive answers with per-host freshness.
///
/// Entries live in a sharded concurrent map; no shard lock is held while the
/// inner backend is queried, so a slow host never delays another one.
pub struct CachingBackend<B> {
    inner: B,
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    capacity: usize,
}

impl<B> CachingBackend<B> {
    /// Wrap a backend.
    pub fn new(inner: B, ttl: Duration, capacity: usize) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            ttl,
            capacity,
        }
    }

    /// Wrap a backend using cache settings from config.
    pub fn from_config(inner: B, config: &CacheConfig) -> Self {
        Self::new(inner, config.ttl(), config.capacity)
    }

    /// Number of cached hosts, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached answer.
    pub fn clear(&self) {
        self.entries.clear();
    }

    fn fresh(&self, key: &str) -> Option<Vec<IpAddr>> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.addrs.clone())
    }

    fn store(&self, key: String, addrs: Vec<IpAddr>) {
        let now = Instant::now();
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.entries.retain(|_, entry| entry.expires_at > now);
            if self.entries.len() >= self.capacity {
                return;
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                addrs,
                expires_at: now + self.ttl,
            },
        );
    }
}

#[async_trait]
impl<B: ResolverBackend> ResolverBackend for CachingBackend<B> {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let key = host.to_ascii_lowercase();
        if let Some(addrs) = self.fresh(&key) {
            return Ok(addrs);
        }

        let addrs = self.inner.lookup(host).await?;
        if !addrs.is_empty() {
            self.store(key, addrs.clone());
        }
        Ok(addrs)
    }

    async fn local_addresses(&self) -> io::Result<Vec<IpAddr>> {
        self.inner.local_addresses().await
    }

    fn local_host_name(&self) -> Option<String> {
        self.inner.local_host_name()
    }
}

/// Resolution policy over a backend.
pub struct Resolver<B> {
    backend: Arc<B>,
    timeout: Duration,
    permits: Arc<Semaphore>,
    prefer_ipv4: bool,
}

impl<B: ResolverBackend> Resolver<B> {
    /// Create a resolver with limits from config.
    pub fn new(backend: B, config: &PacConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            timeout: config.resolve_timeout(),
            permits: Arc::new(Semaphore::new(config.max_concurrent_lookups.max(1))),
            prefer_ipv4: config.prefer_ipv4,
        }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Per-call resolution bound.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve a host literal.
    ///
    /// IP literals resolve to themselves. With `prefer_ipv4`, IPv4 results are
    /// moved ahead of IPv6 ones, keeping the backend order otherwise.
    pub async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        match HostKind::classify(host) {
            HostKind::Invalid => Err(PacError::InvalidAddress(host.to_string())),
            HostKind::Ipv4(v4) => Ok(vec![IpAddr::V4(v4)]),
            HostKind::Ipv6(v6) => Ok(vec![IpAddr::V6(v6)]),
            HostKind::Hostname(name) => {
                let query = name.clone();
                let mut addrs = self
                    .bounded(move |backend| async move { backend.lookup(&query).await })
                    .await?;
                if self.prefer_ipv4 {
                    addrs.sort_by_key(|ip| ip.is_ipv6());
                }
                debug!(host = %name, count = addrs.len(), "dns resolved");
                Ok(addrs)
            }
        }
    }

    /// Run a backend call under the concurrency limit and the timeout.
    ///
    /// Waiting for a permit counts against the timeout. The call runs on a
    /// spawned task that owns the permit, so a timed-out lookup keeps its slot
    /// until the backend returns.
    async fn bounded<T, F, Fut>(&self, call: F) -> Result<T>
    where
        F: FnOnce(Arc<B>) -> Fut + Send,
        Fut: Future<Output = io::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let permits = Arc::clone(&self.permits);
        let work = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|e| PacError::Resolution(e.to_string()))?;
            let lookup = call(backend);
            let handle = tokio::spawn(async move {
                let result = lookup.await;
                drop(permit);
                result
            });
            handle
                .await
                .map_err(|e| PacError::Resolution(e.to_string()))?
                .map_err(|e| PacError::Resolution(e.to_string()))
        };

        tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| PacError::Timeout(self.timeout))?
    }

    /// `dnsResolve(host)`: the first address if it is IPv4.
    pub async fn dns_resolve(&self, host: &str) -> Option<String> {
        match self.lookup(host).await {
            Ok(addrs) => match addrs.first() {
                Some(IpAddr::V4(v4)) => Some(v4.to_string()),
                Some(other) => {
                    debug!(host = %host, first = %other, "dnsResolve: first address is not IPv4");
                    None
                }
                None => None,
            },
            Err(e) => {
                debug!(host = %host, error = %e, "dnsResolve failed");
                None
            }
        }
    }

    /// `dnsResolveEx(host)`: every address, space-separated.
    pub async fn dns_resolve_ex(&self, host: &str) -> String {
        match self.lookup(host).await {
            Ok(addrs) => join_addresses(&addrs),
            Err(e) => {
                debug!(host = %host, error = %e, "dnsResolveEx failed");
                String::new()
            }
        }
    }

    /// `isResolvable(host)`.
    pub async fn is_resolvable(&self, host: &str) -> bool {
        match self.lookup(host).await {
            Ok(addrs) => !addrs.is_empty(),
            Err(e) => {
                debug!(host = %host, error = %e, "isResolvable: not resolvable");
                false
            }
        }
    }

    /// `isResolvableEx(host)`.
    pub async fn is_resolvable_ex(&self, host: &str) -> bool {
        self.is_resolvable(host).await
    }

    /// `myIpAddress()`: a non-loopback IPv4 address of this machine.
    ///
    /// Tries the local host name first, then the interface table, and falls
    /// back to `127.0.0.1`.
    pub async fn my_ip_address(&self) -> String {
        if let Some(name) = self.backend.local_host_name() {
            match self.lookup(&name).await {
                Ok(addrs) => {
                    if let Some(v4) = addrs.iter().find_map(usable_ipv4) {
                        return v4.to_string();
                    }
                }
                Err(e) => debug!(host = %name, error = %e, "local host name not resolvable"),
            }
        }

        match self.local_ip_addresses().await {
            Ok(addrs) => {
                if let Some(v4) = addrs.iter().find_map(usable_ipv4) {
                    return v4.to_string();
                }
                debug!("no non-loopback IPv4 interface address");
            }
            Err(e) => warn!(error = %e, "could not enumerate local addresses"),
        }

        FALLBACK_ADDRESS.to_string()
    }

    /// `myIpAddressEx()`: every non-loopback, non-link-local local address.
    pub async fn my_ip_address_ex(&self) -> String {
        match self.local_ip_addresses().await {
            Ok(addrs) => join_addresses(&addrs),
            Err(e) => {
                warn!(error = %e, "could not enumerate local addresses");
                String::new()
            }
        }
    }

    async fn local_ip_addresses(&self) -> Result<Vec<IpAddr>> {
        let addrs = self
            .bounded(|backend| async move { backend.local_addresses().await })
            .await?;
        let usable: Vec<IpAddr> = addrs
            .into_iter()
            .filter(|ip| !ip.is_loopback() && !ip.is_unspecified() && !is_link_local(ip))
            .collect();
        if usable.is_empty() {
            return Err(PacError::NoLocalAddress);
        }
        Ok(usable)
    }
}

fn usable_ipv4(ip: &IpAddr) -> Option<Ipv4Addr> {
    match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() && !v4.is_link_local() => {
            Some(*v4)
        }
        _ => None,
    }
}

fn is_link_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        // fe80::/10
        IpAddr::V6(v6) => v6.segments()[0] & 0xffc0 == 0xfe80,
    }
}

fn join_addresses(addrs: &[IpAddr]) -> String {
    addrs
        .iter()
        .map(|ip| ip.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `sortIpAddressList(list)`.
///
/// Entries may be separated by whitespace or `;`. Malformed entries are
/// dropped. IPv4 sorts before IPv6, each family in numeric order.
pub fn sort_ip_address_list(list: &str) -> String {
    let mut addrs: Vec<IpAddr> = list
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let parsed = host::parse_ip(entry);
            if parsed.is_none() {
                debug!(entry = %entry, "sortIpAddressList: dropping malformed entry");
            }
            parsed
        })
        .collect();

    // `IpAddr` orders V4 before V6, then by numeric value.
    addrs.sort();
    join_addresses(&addrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn config_with_timeout(ms: u64) -> PacConfig {
        PacConfig::builder()
            .resolve_timeout(Duration::from_millis(ms))
            .build()
    }

    fn static_resolver() -> Resolver<StaticBackend> {
        let backend = StaticBackend::new()
            .with_host("intranet.example.com", [ip("10.1.2.3")])
            .with_host("dual.example.com", [ip("2001:db8::5"), ip("192.0.2.5")])
            .with_host("v6only.example.com", [ip("2001:db8::6")])
            .with_host("empty.example.com", [])
            .with_local_addresses([
                ip("127.0.0.1"),
                ip("::1"),
                ip("169.254.10.10"),
                ip("fe80::1"),
                ip("192.168.1.20"),
                ip("2001:db8::20"),
            ]);
        Resolver::new(backend, &PacConfig::default())
    }

    /// Backend whose lookups never finish.
    struct StallingBackend;

    #[async_trait]
    impl ResolverBackend for StallingBackend {
        async fn lookup(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
            std::future::pending().await
        }

        async fn local_addresses(&self) -> io::Result<Vec<IpAddr>> {
            std::future::pending().await
        }
    }

    /// Backend counting lookups that reach it.
    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ResolverBackend for CountingBackend {
        async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if host == "missing.example" {
                return Err(io::Error::new(io::ErrorKind::NotFound, "missing"));
            }
            Ok(vec![ip("203.0.113.7")])
        }

        async fn local_addresses(&self) -> io::Result<Vec<IpAddr>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_lookup_literals_skip_backend() {
        let resolver = Resolver::new(StallingBackend, &config_with_timeout(50));
        assert_eq!(resolver.lookup("10.0.0.1").await.unwrap(), vec![ip("10.0.0.1")]);
        assert_eq!(resolver.lookup("[::1]").await.unwrap(), vec![ip("::1")]);
        assert!(matches!(
            resolver.lookup("not a host").await,
            Err(PacError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_prefers_ipv4() {
        let resolver = static_resolver();
        assert_eq!(
            resolver.lookup("dual.example.com").await.unwrap(),
            vec![ip("192.0.2.5"), ip("2001:db8::5")]
        );

        let backend = StaticBackend::new().with_host("dual", [ip("::5"), ip("10.0.0.5")]);
        let config = PacConfig::builder().prefer_ipv4(false).build();
        let resolver = Resolver::new(backend, &config);
        assert_eq!(
            resolver.lookup("dual").await.unwrap(),
            vec![ip("::5"), ip("10.0.0.5")]
        );
    }

    #[tokio::test]
    async fn test_dns_resolve() {
        let resolver = static_resolver();
        assert_eq!(
            resolver.dns_resolve("intranet.example.com").await.as_deref(),
            Some("10.1.2.3")
        );
        assert_eq!(
            resolver.dns_resolve("INTRANET.example.com.").await.as_deref(),
            Some("10.1.2.3")
        );
        assert_eq!(
            resolver.dns_resolve("dual.example.com").await.as_deref(),
            Some("192.0.2.5")
        );
        assert_eq!(resolver.dns_resolve("v6only.example.com").await, None);
        assert_eq!(resolver.dns_resolve("empty.example.com").await, None);
        assert_eq!(resolver.dns_resolve("unknown.example.com").await, None);
        assert_eq!(resolver.dns_resolve("").await, None);
    }

    #[tokio::test]
    async fn test_dns_resolve_ex() {
        let resolver = static_resolver();
        assert_eq!(
            resolver.dns_resolve_ex("dual.example.com").await,
            "192.0.2.5 2001:db8::5"
        );
        assert_eq!(resolver.dns_resolve_ex("v6only.example.com").await, "2001:db8::6");
        assert_eq!(resolver.dns_resolve_ex("unknown.example.com").await, "");
    }

    #[tokio::test]
    async fn test_is_resolvable() {
        let resolver = static_resolver();
        assert!(resolver.is_resolvable("intranet.example.com").await);
        assert!(resolver.is_resolvable("v6only.example.com").await);
        assert!(!resolver.is_resolvable("empty.example.com").await);
        assert!(!resolver.is_resolvable("unknown.example.com").await);
        assert!(resolver.is_resolvable_ex("v6only.example.com").await);
        assert!(!resolver.is_resolvable_ex("bad..name").await);
    }

    #[tokio::test]
    async fn test_unresolvable_within_timeout() {
        let resolver = Resolver::new(StallingBackend, &config_with_timeout(50));
        let started = Instant::now();

        assert_eq!(resolver.dns_resolve("slow.example.com").await, None);
        assert!(!resolver.is_resolvable("slow.example.com").await);
        assert_eq!(resolver.dns_resolve_ex("slow.example.com").await, "");
        assert!(matches!(
            resolver.lookup("slow.example.com").await,
            Err(PacError::Timeout(_))
        ));

        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_my_ip_address_skips_loopback_and_link_local() {
        let resolver = static_resolver();
        assert_eq!(resolver.my_ip_address().await, "192.168.1.20");
        assert_eq!(
            resolver.my_ip_address_ex().await,
            "192.168.1.20 2001:db8::20"
        );
    }

    #[tokio::test]
    async fn test_my_ip_address_prefers_host_name() {
        let backend = StaticBackend::new()
            .with_host("workstation", [ip("127.0.1.1"), ip("10.9.8.7")])
            .with_host_name("workstation")
            .with_local_addresses([ip("192.168.1.20")]);
        let resolver = Resolver::new(backend, &PacConfig::default());
        assert_eq!(resolver.my_ip_address().await, "10.9.8.7");
    }

    #[tokio::test]
    async fn test_my_ip_address_fallback() {
        let backend = StaticBackend::new().with_local_addresses([ip("127.0.0.1"), ip("::1")]);
        let resolver = Resolver::new(backend, &PacConfig::default());
        assert_eq!(resolver.my_ip_address().await, "127.0.0.1");
        assert_eq!(resolver.my_ip_address_ex().await, "");

        let resolver = Resolver::new(StallingBackend, &config_with_timeout(50));
        assert_eq!(resolver.my_ip_address().await, "127.0.0.1");
        assert_eq!(resolver.my_ip_address_ex().await, "");
    }

    #[tokio::test]
    async fn test_concurrency_limit_counts_against_timeout() {
        let config = PacConfig::builder()
            .resolve_timeout(Duration::from_millis(50))
            .max_concurrent_lookups(1)
            .build();
        let resolver = Arc::new(Resolver::new(StallingBackend, &config));

        let first = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.is_resolvable("a.example").await })
        };
        let second = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.is_resolvable("b.example").await })
        };

        assert!(!first.await.unwrap());
        assert!(!second.await.unwrap());
        // The stalled lookup still occupies the only slot.
        assert_eq!(resolver.permits.available_permits(), 0);
    }

    /// Backend doing its work on the blocking pool, tracking overlap.
    struct BlockingBackend {
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        work: Duration,
    }

    #[async_trait]
    impl ResolverBackend for BlockingBackend {
        async fn lookup(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
            let running = Arc::clone(&self.running);
            let peak = Arc::clone(&self.peak);
            let work = self.work;
            tokio::task::spawn_blocking(move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(work);
                running.fetch_sub(1, Ordering::SeqCst);
            })
            .await
            .map_err(io::Error::other)?;
            Err(io::Error::new(io::ErrorKind::NotFound, "slow miss"))
        }

        async fn local_addresses(&self) -> io::Result<Vec<IpAddr>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_timed_out_lookups_keep_their_slot() {
        let config = PacConfig::builder()
            .resolve_timeout(Duration::from_millis(30))
            .max_concurrent_lookups(1)
            .build();
        let peak = Arc::new(AtomicUsize::new(0));
        let backend = BlockingBackend {
            running: Arc::new(AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
            work: Duration::from_millis(300),
        };
        let resolver = Resolver::new(backend, &config);

        for i in 0..6 {
            assert!(!resolver.is_resolvable(&format!("slow{i}.example")).await);
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);

        // The slot comes back once the abandoned lookup completes.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(resolver.permits.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_caching_backend_reuses_fresh_answers() {
        let backend = CachingBackend::new(
            CountingBackend {
                calls: AtomicUsize::new(0),
            },
            Duration::from_secs(60),
            8,
        );

        assert_eq!(backend.lookup("Cached.Example").await.unwrap(), vec![ip("203.0.113.7")]);
        assert_eq!(backend.lookup("cached.example").await.unwrap(), vec![ip("203.0.113.7")]);
        assert_eq!(backend.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.len(), 1);

        // Failures are not cached.
        assert!(backend.lookup("missing.example").await.is_err());
        assert!(backend.lookup("missing.example").await.is_err());
        assert_eq!(backend.inner.calls.load(Ordering::SeqCst), 3);

        backend.clear();
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_caching_backend_expires_entries() {
        let backend = CachingBackend::new(
            CountingBackend {
                calls: AtomicUsize::new(0),
            },
            Duration::ZERO,
            8,
        );

        backend.lookup("a.example").await.unwrap();
        backend.lookup("a.example").await.unwrap();
        assert_eq!(backend.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_caching_backend_respects_capacity() {
        let backend = CachingBackend::new(
            CountingBackend {
                calls: AtomicUsize::new(0),
            },
            Duration::from_secs(60),
            2,
        );

        for host in ["a.example", "b.example", "c.example"] {
            backend.lookup(host).await.unwrap();
        }
        assert_eq!(backend.len(), 2);

        // The overflow host still resolves, it is just not cached.
        backend.lookup("c.example").await.unwrap();
        assert_eq!(backend.inner.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_sort_ip_address_list() {
        assert_eq!(
            sort_ip_address_list("2001:db8::1 10.0.0.2 10.0.0.1"),
            "10.0.0.1 10.0.0.2 2001:db8::1"
        );
        assert_eq!(
            sort_ip_address_list("10.0.0.10;10.0.0.9; ::1 ;fe80::1"),
            "10.0.0.9 10.0.0.10 ::1 fe80::1"
        );
        assert_eq!(
            sort_ip_address_list("2001:db8::2 2001:db8::10 2001:db8::1"),
            "2001:db8::1 2001:db8::2 2001:db8::10"
        );
    }

    #[test]
    fn test_sort_ip_address_list_drops_malformed() {
        assert_eq!(
            sort_ip_address_list("banana 10.0.0.1 300.1.1.1 [::2] ::zz"),
            "10.0.0.1 ::2"
        );
        assert_eq!(sort_ip_address_list(""), "");
        assert_eq!(sort_ip_address_list("  ;; "), "");
    }
}
