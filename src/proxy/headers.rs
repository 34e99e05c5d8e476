//! HTTP header constants and the header forwarding policy
//!
//! Which headers cross the proxy in each direction is declared in two
//! tables: [`UPSTREAM_REQUEST_RULES`] for the call to a backend and
//! [`CLIENT_RESPONSE_RULES`] for the response relayed to the client. Both
//! are applied by [`apply_rules`].

use crate::proxy::types::ProxyRequestContext;
use ::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Header name for request ID used for tracing and correlation
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Header carrying the static service credential
pub const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

/// Comma-separated client address chain
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Host the client originally asked for
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Single client address set by some load balancers
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Edge-injected geolocation headers
pub const X_EDGE_IP_COUNTRY: HeaderName = HeaderName::from_static("x-edge-ip-country");
pub const X_EDGE_IP_CITY: HeaderName = HeaderName::from_static("x-edge-ip-city");
pub const X_EDGE_CONNECTING_IP: HeaderName = HeaderName::from_static("x-edge-connecting-ip");

/// Standard header re-exports for convenience
pub use header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, HOST, LOCATION, REFERER, USER_AGENT};

/// Well-known paths
pub mod paths {
    /// Health check endpoint path
    pub const HEALTH: &str = "/health";

    /// Backend endpoints, relative to the upstream base URL
    pub mod upstream {
        pub const DOMAIN_CONFIG: &str = "/api/domain-config";
        pub const REDIRECT: &str = "/api/redirect";
        pub const BIOPAGE: &str = "/api/biopage";
    }
}

/// Query parameter names understood by the backends
pub mod query {
    pub const DOMAIN: &str = "domain";
    pub const CODE: &str = "code";
    pub const SLUG: &str = "slug";
}

pub mod content_types {
    pub const HTML: &str = "text/html";
    pub const HTML_UTF8: &str = "text/html; charset=utf-8";
    pub const JSON: &str = "application/json";
}

pub mod cache_directives {
    /// Applied to relayed content when the upstream sent no directive
    pub const NO_STORE_STRICT: &str = "no-store, no-cache, must-revalidate";
    /// Applied to locally generated pages
    pub const NO_STORE: &str = "no-store";
}

/// How a header is treated when crossing the proxy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardPolicy {
    /// Always set; falls back to the rule's default when the source is absent
    Always,
    /// Set only when the source has a value
    IfPresent,
    /// Never copied
    Never,
}

/// One row of a forwarding table
///
/// `source` extracts the value from whatever the table reads from: the
/// request context for upstream calls, the upstream headers for responses.
pub struct HeaderRule<S> {
    pub name: HeaderName,
    pub policy: ForwardPolicy,
    pub default: &'static str,
    pub source: fn(&S) -> Option<&str>,
}

/// Headers sent to a backend, derived from the inbound request
pub static UPSTREAM_REQUEST_RULES: [HeaderRule<ProxyRequestContext>; 8] = [
    HeaderRule {
        name: X_FORWARDED_FOR,
        policy: ForwardPolicy::Always,
        default: "",
        source: ProxyRequestContext::client_ip,
    },
    HeaderRule {
        name: X_FORWARDED_HOST,
        policy: ForwardPolicy::Always,
        default: "",
        source: ProxyRequestContext::forwarded_host,
    },
    HeaderRule {
        name: USER_AGENT,
        policy: ForwardPolicy::Always,
        default: "",
        source: ProxyRequestContext::user_agent,
    },
    HeaderRule {
        name: REFERER,
        policy: ForwardPolicy::Always,
        default: "",
        source: ProxyRequestContext::referer,
    },
    HeaderRule {
        name: ACCEPT,
        policy: ForwardPolicy::Always,
        default: "",
        source: ProxyRequestContext::accept,
    },
    HeaderRule {
        name: X_EDGE_IP_COUNTRY,
        policy: ForwardPolicy::IfPresent,
        default: "",
        source: ProxyRequestContext::geo_country,
    },
    HeaderRule {
        name: X_EDGE_IP_CITY,
        policy: ForwardPolicy::IfPresent,
        default: "",
        source: ProxyRequestContext::geo_city,
    },
    HeaderRule {
        name: X_EDGE_CONNECTING_IP,
        policy: ForwardPolicy::IfPresent,
        default: "",
        source: ProxyRequestContext::geo_ip,
    },
];

/// Headers relayed to the client from a non-redirect upstream response
///
/// Redirects bypass this table; they carry only the upstream `location`.
pub static CLIENT_RESPONSE_RULES: [HeaderRule<HeaderMap>; 2] = [
    HeaderRule {
        name: CONTENT_TYPE,
        policy: ForwardPolicy::Always,
        default: content_types::HTML,
        source: upstream_content_type,
    },
    HeaderRule {
        name: CACHE_CONTROL,
        policy: ForwardPolicy::Always,
        default: cache_directives::NO_STORE_STRICT,
        source: upstream_cache_control,
    },
];

fn upstream_content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

fn upstream_cache_control(headers: &HeaderMap) -> Option<&str> {
    headers.get(CACHE_CONTROL).and_then(|v| v.to_str().ok())
}

/// Apply a forwarding table, reading from `source` and writing into `target`
///
/// A value that is not a legal header value counts as absent.
pub fn apply_rules<S>(rules: &[HeaderRule<S>], source: &S, target: &mut HeaderMap) {
    for rule in rules {
        if rule.policy == ForwardPolicy::Never {
            continue;
        }

        let value = (rule.source)(source).and_then(|raw| HeaderValue::from_str(raw).ok());

        match (rule.policy, value) {
            (_, Some(value)) => {
                target.insert(rule.name.clone(), value);
            }
            (ForwardPolicy::Always, None) => {
                target.insert(rule.name.clone(), HeaderValue::from_static(rule.default));
            }
            _ => {}
        }
    }
}
