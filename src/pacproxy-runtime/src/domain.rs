//! Host name predicates.
//!
//! These are plain string operations on the script-supplied values: no
//! normalization, no resolution, case-sensitive.

/// `dnsDomainIs(host, domain)`.
///
/// Known legacy quirk: this is a plain string suffix test, not a label-aware
/// one. `dnsDomainIs("notexample.com", "example.com")` is `true`, just as in
/// every browser. Scripts rely on the behavior, so it is kept.
pub fn dns_domain_is(host: &str, domain: &str) -> bool {
    host.ends_with(domain)
}

/// `isPlainHostName(host)`: true when the host has no dot.
pub fn is_plain_host_name(host: &str) -> bool {
    !host.contains('.')
}

/// `localHostOrDomainIs(host, hostdom)`.
///
/// True on an exact match, or when `host` is unqualified and equals the first
/// label of `hostdom` (`"www"` vs `"www.example.com"`).
pub fn local_host_or_domain_is(host: &str, hostdom: &str) -> bool {
    if host == hostdom {
        return true;
    }
    if host.is_empty() || !is_plain_host_name(host) {
        return false;
    }
    hostdom
        .split_once('.')
        .is_some_and(|(first_label, _)| first_label == host)
}

/// `dnsDomainLevels(host)`: the number of dots.
pub fn dns_domain_levels(host: &str) -> usize {
    host.matches('.').count()
}
