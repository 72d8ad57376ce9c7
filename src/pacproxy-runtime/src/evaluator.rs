//! Per-request evaluation of a PAC script.

use async_trait::async_trait;
use tracing::{debug, error};

use super::Result;
use super::directive::ProxyDirective;

/// Entry points a PAC script may define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// `FindProxyForURL(url, host)`
    FindProxyForUrl,
    /// `FindProxyForURLEx(url, host)`, the IPv6-aware variant.
    FindProxyForUrlEx,
}

impl EntryPoint {
    pub fn name(&self) -> &'static str {
        match self {
            EntryPoint::FindProxyForUrl => "FindProxyForURL",
            EntryPoint::FindProxyForUrlEx => "FindProxyForURLEx",
        }
    }
}

/// Executes a loaded PAC script.
///
/// Implementations bind a [`PacFunctions`](crate::PacFunctions) into the
/// script's globals (see [`invoke`](crate::invoke)) and run the entry point.
#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// Check if the script defines `entry`.
    fn defines(&self, entry: EntryPoint) -> bool;

    /// Call `entry(url, host)` and return the script's string result.
    async fn call(&self, entry: EntryPoint, url: &str, host: &str) -> Result<String>;
}

/// Drives a [`ScriptHost`] for each outbound request.
pub struct PacEvaluator<H> {
    host: H,
}

impl<H: ScriptHost> PacEvaluator<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn script_host(&self) -> &H {
        &self.host
    }

    /// Entry point used for requests: `FindProxyForURLEx` when defined.
    pub fn entry_point(&self) -> EntryPoint {
        if self.host.defines(EntryPoint::FindProxyForUrlEx) {
            EntryPoint::FindProxyForUrlEx
        } else {
            EntryPoint::FindProxyForUrl
        }
    }

    /// Pick the proxies for `url`.
    ///
    /// Script failures never block the request: they are logged and the
    /// result is `DIRECT`.
    pub async fn find_proxy(&self, url: &str) -> ProxyDirective {
        let host = request_host(url);
        let entry = self.entry_point();

        match self.host.call(entry, url, &host).await {
            Ok(result) => {
                let directive = ProxyDirective::parse(&result);
                debug!(
                    url = %url,
                    host = %host,
                    entry = entry.name(),
                    directive = %directive,
                    "Resolved proxy directive"
                );
                directive
            }
            Err(e) => {
                error!(url = %url, entry = entry.name(), error = %e, "PAC evaluation failed, going DIRECT");
                ProxyDirective::direct()
            }
        }
    }
}

/// Host passed as the second entry point argument.
///
/// Taken from the URL authority when `url` is absolute, without IPv6
/// brackets. CONNECT-style targets (`host:port`) fall back to the part before
/// the port.
pub fn request_host(url: &str) -> String {
    let parsed = url::Url::parse(url).ok();
    if let Some(host) = parsed.as_ref().and_then(|parsed| parsed.host_str()) {
        return host.trim_start_matches('[').trim_end_matches(']').to_string();
    }

    let target = url.trim();
    if let Some((v6, _)) = target
        .strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
    {
        return v6.to_string();
    }
    target
        .split_once(':')
        .map_or(target, |(host, _)| host)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PacError;
    use std::sync::Mutex;

    struct FakeScript {
        has_ex: bool,
        answer: std::result::Result<&'static str, &'static str>,
        calls: Mutex<Vec<(EntryPoint, String, String)>>,
    }

    impl FakeScript {
        fn answering(answer: &'static str) -> Self {
            Self {
                has_ex: false,
                answer: Ok(answer),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ScriptHost for FakeScript {
        fn defines(&self, entry: EntryPoint) -> bool {
            match entry {
                EntryPoint::FindProxyForUrl => true,
                EntryPoint::FindProxyForUrlEx => self.has_ex,
            }
        }

        async fn call(&self, entry: EntryPoint, url: &str, host: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((entry, url.to_string(), host.to_string()));
            self.answer
                .map(str::to_string)
                .map_err(|e| PacError::Script(e.to_string()))
        }
    }

    #[test]
    fn test_request_host() {
        assert_eq!(request_host("http://www.example.com/index.html"), "www.example.com");
        assert_eq!(request_host("https://WWW.Example.com:8443/x"), "www.example.com");
        assert_eq!(request_host("http://[2001:db8::1]:8080/"), "2001:db8::1");
        assert_eq!(request_host("http://10.0.0.1/"), "10.0.0.1");
        assert_eq!(request_host("www.example.com:443"), "www.example.com");
        assert_eq!(request_host("[2001:db8::1]:443"), "2001:db8::1");
        assert_eq!(request_host("intranet"), "intranet");
    }

    #[tokio::test]
    async fn test_find_proxy_parses_result() {
        let evaluator = PacEvaluator::new(FakeScript::answering("PROXY p.example:3128; DIRECT"));
        let directive = evaluator.find_proxy("http://a.example/").await;
        assert_eq!(directive.to_string(), "PROXY p.example:3128; DIRECT");

        let calls = evaluator.script_host().calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[(
                EntryPoint::FindProxyForUrl,
                "http://a.example/".to_string(),
                "a.example".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_find_proxy_prefers_ex_entry_point() {
        let mut script = FakeScript::answering("DIRECT");
        script.has_ex = true;
        let evaluator = PacEvaluator::new(script);
        assert_eq!(evaluator.entry_point(), EntryPoint::FindProxyForUrlEx);

        evaluator.find_proxy("http://a.example/").await;
        let calls = evaluator.script_host().calls.lock().unwrap();
        assert_eq!(calls[0].0, EntryPoint::FindProxyForUrlEx);
    }

    #[tokio::test]
    async fn test_find_proxy_fails_open() {
        let script = FakeScript {
            has_ex: false,
            answer: Err("ReferenceError: foo is not defined"),
            calls: Mutex::new(Vec::new()),
        };
        let evaluator = PacEvaluator::new(script);
        assert_eq!(
            evaluator.find_proxy("http://a.example/").await,
            ProxyDirective::direct()
        );

        let evaluator = PacEvaluator::new(FakeScript::answering("nonsense"));
        assert_eq!(
            evaluator.find_proxy("http://a.example/").await,
            ProxyDirective::direct()
        );
    }

    #[test]
    fn test_entry_point_names() {
        assert_eq!(EntryPoint::FindProxyForUrl.name(), "FindProxyForURL");
        assert_eq!(EntryPoint::FindProxyForUrlEx.name(), "FindProxyForURLEx");
    }
}
