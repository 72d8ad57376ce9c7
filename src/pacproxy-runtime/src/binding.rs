//! Binding of script-level calls onto [`PacFunctions`].
//!
//! Script hosts hand over loosely-typed values. This module fixes how they are
//! coerced before reaching the library:
//!
//! | value                 | as a string argument             |
//! |-----------------------|----------------------------------|
//! | string                | used as is                       |
//! | number                | script `Number` to string form   |
//! |                       | (`42`, `1.5`, `1e+21`, `1e-7`)   |
//! | `NaN`, `±Infinity`    | `NaN`, `Infinity`, `-Infinity`   |
//! | boolean               | rejected                         |
//! | `null` / `undefined`  | rejected                         |
//! | missing argument      | rejected                         |
//!
//! A rejected argument is logged and the call returns the function's
//! "not found" value (`false`, `null`, `""` or `0`). `log` stringifies
//! everything and never rejects.

use tracing::{debug, warn};

use super::library::PacFunctions;
use super::{PacError, Result};

/// A value exchanged with a script host.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl ScriptValue {
    /// Script type name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
        }
    }

    /// Coerce to a string argument under the policy in the module docs.
    pub fn coerce_to_string(&self) -> Result<String> {
        match self {
            ScriptValue::String(s) => Ok(s.clone()),
            ScriptValue::Number(n) => Ok(format_number(*n)),
            other => Err(PacError::Coercion(other.type_name())),
        }
    }

    /// Render any value the way a script would print it.
    pub fn to_display_string(&self) -> String {
        match self {
            ScriptValue::Undefined => "undefined".to_string(),
            ScriptValue::Null => "null".to_string(),
            ScriptValue::Bool(b) => b.to_string(),
            ScriptValue::Number(n) => format_number(*n),
            ScriptValue::String(s) => s.clone(),
        }
    }

    /// Script truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            ScriptValue::Undefined | ScriptValue::Null => false,
            ScriptValue::Bool(b) => *b,
            ScriptValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ScriptValue::String(s) => !s.is_empty(),
        }
    }
}

/// Script `Number` to string conversion.
///
/// Shortest round-trip digits, in plain decimal when the decimal point falls
/// within `1e-7 < |n| < 1e21`, in exponent form (`1.5e+21`) otherwise.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == f64::INFINITY {
        return "Infinity".to_string();
    }
    if n == f64::NEG_INFINITY {
        return "-Infinity".to_string();
    }
    if n == 0.0 {
        // Covers -0 as well.
        return "0".to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "1.2345e3".
    let scientific = format!("{:e}", n.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return n.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return n.to_string();
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let len = digits.len() as i32;
    // Position of the decimal point relative to the first digit.
    let point = exponent + 1;

    let body = if len <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - len) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat(-point as usize))
    } else {
        let (first, rest) = digits.split_at(1);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{first}e{exp_sign}{}", exponent.abs())
        } else {
            format!("{first}.{rest}e{exp_sign}{}", exponent.abs())
        }
    };

    if n < 0.0 { format!("-{body}") } else { body }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::String(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        ScriptValue::String(s)
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        ScriptValue::Number(n)
    }
}

impl From<usize> for ScriptValue {
    fn from(n: usize) -> Self {
        ScriptValue::Number(n as f64)
    }
}

impl From<Option<String>> for ScriptValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(ScriptValue::Null, ScriptValue::String)
    }
}

/// Every function a script can call, under its script name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacFunction {
    DnsDomainIs,
    DnsDomainLevels,
    DnsResolve,
    IsPlainHostName,
    IsResolvable,
    IsInNet,
    LocalHostOrDomainIs,
    MyIpAddress,
    ShExpMatch,
    Log,
    IsResolvableEx,
    IsInNetEx,
    DnsResolveEx,
    MyIpAddressEx,
    SortIpAddressList,
    GetClientVersion,
}

impl PacFunction {
    /// All functions, in binding order.
    pub const ALL: [PacFunction; 16] = [
        PacFunction::DnsDomainIs,
        PacFunction::DnsDomainLevels,
        PacFunction::DnsResolve,
        PacFunction::IsPlainHostName,
        PacFunction::IsResolvable,
        PacFunction::IsInNet,
        PacFunction::LocalHostOrDomainIs,
        PacFunction::MyIpAddress,
        PacFunction::ShExpMatch,
        PacFunction::Log,
        PacFunction::IsResolvableEx,
        PacFunction::IsInNetEx,
        PacFunction::DnsResolveEx,
        PacFunction::MyIpAddressEx,
        PacFunction::SortIpAddressList,
        PacFunction::GetClientVersion,
    ];

    /// Name under which the function is bound in the script.
    pub fn name(&self) -> &'static str {
        match self {
            PacFunction::DnsDomainIs => "dnsDomainIs",
            PacFunction::DnsDomainLevels => "dnsDomainLevels",
            PacFunction::DnsResolve => "dnsResolve",
            PacFunction::IsPlainHostName => "isPlainHostName",
            PacFunction::IsResolvable => "isResolvable",
            PacFunction::IsInNet => "isInNet",
            PacFunction::LocalHostOrDomainIs => "localHostOrDomainIs",
            PacFunction::MyIpAddress => "myIpAddress",
            PacFunction::ShExpMatch => "shExpMatch",
            PacFunction::Log => "log",
            PacFunction::IsResolvableEx => "isResolvableEx",
            PacFunction::IsInNetEx => "isInNetEx",
            PacFunction::DnsResolveEx => "dnsResolveEx",
            PacFunction::MyIpAddressEx => "myIpAddressEx",
            PacFunction::SortIpAddressList => "sortIpAddressList",
            PacFunction::GetClientVersion => "getClientVersion",
        }
    }

    /// Look a function up by script name.
    ///
    /// `myIPAddressEx` is accepted as an alias, since both spellings are in use.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "myIPAddressEx" {
            return Some(PacFunction::MyIpAddressEx);
        }
        Self::ALL.into_iter().find(|function| function.name() == name)
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        match self {
            PacFunction::MyIpAddress
            | PacFunction::MyIpAddressEx
            | PacFunction::GetClientVersion => 0,
            PacFunction::DnsDomainLevels
            | PacFunction::DnsResolve
            | PacFunction::IsPlainHostName
            | PacFunction::IsResolvable
            | PacFunction::Log
            | PacFunction::IsResolvableEx
            | PacFunction::DnsResolveEx
            | PacFunction::SortIpAddressList => 1,
            PacFunction::DnsDomainIs
            | PacFunction::LocalHostOrDomainIs
            | PacFunction::ShExpMatch
            | PacFunction::IsInNetEx => 2,
            PacFunction::IsInNet => 3,
        }
    }

    /// Value returned when an argument is rejected.
    fn sentinel(&self) -> ScriptValue {
        match self {
            PacFunction::DnsResolve => ScriptValue::Null,
            PacFunction::DnsDomainLevels => ScriptValue::Number(0.0),
            PacFunction::DnsResolveEx
            | PacFunction::MyIpAddress
            | PacFunction::MyIpAddressEx
            | PacFunction::SortIpAddressList
            | PacFunction::GetClientVersion => ScriptValue::String(String::new()),
            PacFunction::Log => ScriptValue::Undefined,
            _ => ScriptValue::Bool(false),
        }
    }
}

impl std::fmt::Display for PacFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PacFunction {
    type Err = PacError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| PacError::Script(format!("unknown PAC function: {s}")))
    }
}

/// Coerce the first `N` arguments to strings, logging the first rejection.
fn string_args<const N: usize>(function: PacFunction, args: &[ScriptValue]) -> Option<[String; N]> {
    let mut coerced = Vec::with_capacity(N);
    for index in 0..N {
        let value = match args.get(index) {
            Some(value) => value.coerce_to_string(),
            None => Err(PacError::Coercion("missing")),
        };
        match value {
            Ok(s) => {
                if let Some(ScriptValue::Number(_)) = args.get(index) {
                    debug!(function = %function, argument = index, value = %s, "coerced number argument");
                }
                coerced.push(s);
            }
            Err(e) => {
                warn!(function = %function, argument = index, error = %e, "rejected script argument");
                return None;
            }
        }
    }
    coerced.try_into().ok()
}

/// Call `function` with script arguments and return its script value.
///
/// Extra arguments are ignored, as scripts do.
pub async fn invoke<F: PacFunctions + ?Sized>(
    library: &F,
    function: PacFunction,
    args: &[ScriptValue],
) -> ScriptValue {
    match function {
        PacFunction::Log => {
            let message = args
                .first()
                .map(ScriptValue::to_display_string)
                .unwrap_or_default();
            library.log(&message);
            ScriptValue::Undefined
        }
        PacFunction::MyIpAddress => library.my_ip_address().await.into(),
        PacFunction::MyIpAddressEx => library.my_ip_address_ex().await.into(),
        PacFunction::GetClientVersion => library.get_client_version().into(),
        PacFunction::DnsDomainIs => match string_args(function, args) {
            Some([host, domain]) => library.dns_domain_is(&host, &domain).into(),
            None => function.sentinel(),
        },
        PacFunction::DnsDomainLevels => match string_args(function, args) {
            Some([host]) => library.dns_domain_levels(&host).into(),
            None => function.sentinel(),
        },
        PacFunction::DnsResolve => match string_args(function, args) {
            Some([host]) => library.dns_resolve(&host).await.into(),
            None => function.sentinel(),
        },
        PacFunction::IsPlainHostName => match string_args(function, args) {
            Some([host]) => library.is_plain_host_name(&host).into(),
            None => function.sentinel(),
        },
        PacFunction::IsResolvable => match string_args(function, args) {
            Some([host]) => library.is_resolvable(&host).await.into(),
            None => function.sentinel(),
        },
        PacFunction::IsInNet => match string_args(function, args) {
            Some([host, pattern, mask]) => library.is_in_net(&host, &pattern, &mask).await.into(),
            None => function.sentinel(),
        },
        PacFunction::LocalHostOrDomainIs => match string_args(function, args) {
            Some([host, hostdom]) => library.local_host_or_domain_is(&host, &hostdom).into(),
            None => function.sentinel(),
        },
        PacFunction::ShExpMatch => match string_args(function, args) {
            Some([subject, pattern]) => library.sh_exp_match(&subject, &pattern).into(),
            None => function.sentinel(),
        },
        PacFunction::IsResolvableEx => match string_args(function, args) {
            Some([host]) => library.is_resolvable_ex(&host).await.into(),
            None => function.sentinel(),
        },
        PacFunction::IsInNetEx => match string_args(function, args) {
            Some([host, prefix]) => library.is_in_net_ex(&host, &prefix).await.into(),
            None => function.sentinel(),
        },
        PacFunction::DnsResolveEx => match string_args(function, args) {
            Some([host]) => library.dns_resolve_ex(&host).await.into(),
            None => function.sentinel(),
        },
        PacFunction::SortIpAddressList => match string_args(function, args) {
            Some([list]) => library.sort_ip_address_list(&list).into(),
            None => function.sentinel(),
        },
    }
}
