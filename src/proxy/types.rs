//! Type definitions for the proxy module

use crate::proxy::gate::DEFAULT_IGNORED_PREFIXES;
use crate::proxy::headers::{
    X_EDGE_CONNECTING_IP, X_EDGE_IP_CITY, X_EDGE_IP_COUNTRY, X_FORWARDED_FOR, X_REAL_IP,
};
use http::header::{AsHeaderName, ACCEPT, HOST, REFERER, USER_AGENT};
use http::uri::Authority;
use http::{HeaderMap, Uri};
use nutype::nutype;
#[allow(unused_imports)] // Used by nutype derive macros
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// ========== Constants ==========

/// Base URL of the serverless backends
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.linkbio.app";

/// Credential used when no override is configured
pub const DEFAULT_API_KEY: &str = "edge-router-development-key";

/// How long a domain-purpose cache generation is trusted
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

// ========== Configuration Types ==========

/// Base URL shared by the domain-config, redirect and biopage backends
#[nutype(
    sanitize(trim),
    validate(predicate = |s: &str| s.starts_with("http://") || s.starts_with("https://")),
    derive(Clone, Debug, Display, Deserialize, Serialize, TryFrom, AsRef),
)]
pub struct UpstreamBaseUrl(String);

/// Static service credential attached to every upstream call
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(Clone, Hash, PartialEq, Eq, Deserialize, Serialize, TryFrom, AsRef),
)]
pub struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Edge service configuration
#[derive(Clone, Debug)]
pub struct EdgeConfig {
    /// Where the backend functions live
    pub base_url: UpstreamBaseUrl,
    /// Credential sent in the `x-api-key` header
    pub api_key: ApiKey,
    /// Lifetime of one domain-purpose cache generation
    pub cache_ttl: Duration,
    /// Path prefixes answered with 404 before any network call
    pub ignored_prefixes: Vec<String>,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            base_url: UpstreamBaseUrl::try_new(DEFAULT_UPSTREAM_BASE_URL)
                .expect("default upstream URL is valid"),
            api_key: ApiKey::try_new(DEFAULT_API_KEY).expect("default API key is valid"),
            cache_ttl: DEFAULT_CACHE_TTL,
            ignored_prefixes: DEFAULT_IGNORED_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
        }
    }
}

// ========== Request Context ==========

/// Geolocation hints injected by the edge platform
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeoHints {
    pub country: Option<String>,
    pub city: Option<String>,
    pub ip: Option<String>,
}

impl GeoHints {
    /// Read the trusted edge headers; `None` when none of them is present
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let hints = Self {
            country: header_string(headers, X_EDGE_IP_COUNTRY),
            city: header_string(headers, X_EDGE_IP_CITY),
            ip: header_string(headers, X_EDGE_CONNECTING_IP),
        };

        if hints == Self::default() {
            None
        } else {
            Some(hints)
        }
    }
}

/// Everything the pipeline needs from an inbound request
///
/// Built once per request and never mutated afterwards. Missing values are
/// kept as absent rather than rejected; routing is best-effort.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyRequestContext {
    host: String,
    path: String,
    client_ip: Option<String>,
    user_agent: Option<String>,
    referer: Option<String>,
    accept: Option<String>,
    geo: Option<GeoHints>,
}

impl ProxyRequestContext {
    /// Derive the context from the inbound URI and headers
    ///
    /// The host comes from the `Host` header (falling back to the URI
    /// authority) with the port stripped. The path has one leading `/`
    /// removed and is otherwise kept verbatim, still percent-encoded.
    pub fn from_request_parts(uri: &Uri, headers: &HeaderMap) -> Self {
        let host = header_str(headers, HOST)
            .and_then(host_without_port)
            .or_else(|| uri.host().map(normalize_host))
            .unwrap_or_default();

        let raw_path = uri.path();
        let path = raw_path.strip_prefix('/').unwrap_or(raw_path).to_string();

        let client_ip = header_str(headers, X_FORWARDED_FOR)
            .and_then(|list| list.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .or_else(|| header_str(headers, X_REAL_IP))
            .map(str::to_string);

        Self {
            host,
            path,
            client_ip,
            user_agent: header_string(headers, USER_AGENT),
            referer: header_string(headers, REFERER),
            accept: header_string(headers, ACCEPT),
            geo: GeoHints::from_headers(headers),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn geo(&self) -> Option<&GeoHints> {
        self.geo.as_ref()
    }

    pub fn client_ip(&self) -> Option<&str> {
        self.client_ip.as_deref()
    }

    /// The original host, or `None` when the request carried none
    pub fn forwarded_host(&self) -> Option<&str> {
        Some(self.host.as_str()).filter(|host| !host.is_empty())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    pub fn geo_country(&self) -> Option<&str> {
        self.geo.as_ref().and_then(|geo| geo.country.as_deref())
    }

    pub fn geo_city(&self) -> Option<&str> {
        self.geo.as_ref().and_then(|geo| geo.city.as_deref())
    }

    pub fn geo_ip(&self) -> Option<&str> {
        self.geo.as_ref().and_then(|geo| geo.ip.as_deref())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: impl AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn header_string(headers: &HeaderMap, name: impl AsHeaderName) -> Option<String> {
    header_str(headers, name).map(str::to_string)
}

fn host_without_port(value: &str) -> Option<String> {
    value
        .trim()
        .parse::<Authority>()
        .ok()
        .map(|authority| normalize_host(authority.host()))
}

/// Lower-case a host and drop the trailing dot of a fully qualified name
fn normalize_host(host: &str) -> String {
    host.strip_suffix('.').unwrap_or(host).to_ascii_lowercase()
}

// ========== Errors ==========

/// Errors that can occur while serving a request after the gate
///
/// Every variant ends up as the fallback page; none of them is ever shown to
/// the client verbatim.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Invalid target URL: {0}")]
    InvalidTargetUrl(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] http::Error),

    #[error("Invalid header: {name}")]
    InvalidHeader { name: String },
}

/// Result type for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;
