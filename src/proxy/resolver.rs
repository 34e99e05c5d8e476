//! Domain purpose resolution: cache first, remote lookup second
//!
//! Resolution never fails from the caller's point of view. A failed lookup
//! is reported as [`Resolution::Unresolved`] and collapsed to
//! [`DomainPurpose::Links`] by [`Resolution::purpose`], the only place where
//! that default is applied.

use crate::domain::{DomainName, DomainPurpose};
use crate::proxy::cache::{Clock, DomainPurposeCache, SystemClock};
use crate::proxy::headers::{content_types, paths, query, ACCEPT, X_API_KEY};
use crate::proxy::types::{ApiKey, UpstreamBaseUrl};
use async_trait::async_trait;
use http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Why a domain's purpose could not be determined
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Invalid domain: {0:?}")]
    InvalidDomain(String),

    #[error("Lookup request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Lookup returned status {0}")]
    Status(StatusCode),

    #[error("Lookup response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Body returned by the domain-configuration backend
#[derive(Debug, Default, Deserialize)]
pub struct DomainConfigResponse {
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub found: Option<bool>,
}

impl DomainConfigResponse {
    pub fn purpose(&self) -> DomainPurpose {
        self.purpose
            .as_deref()
            .map(DomainPurpose::from_wire)
            .unwrap_or_default()
    }
}

/// Remote source of truth for domain purposes
#[async_trait]
pub trait PurposeLookup: Send + Sync {
    async fn lookup(&self, domain: &DomainName) -> Result<DomainPurpose, LookupError>;
}

/// Looks purposes up from the domain-configuration backend over HTTP
pub struct HttpPurposeLookup {
    client: reqwest::Client,
    endpoint: String,
    api_key: ApiKey,
}

impl HttpPurposeLookup {
    pub fn new(client: reqwest::Client, base_url: &UpstreamBaseUrl, api_key: ApiKey) -> Self {
        let endpoint = format!(
            "{}{}",
            base_url.as_ref().trim_end_matches('/'),
            paths::upstream::DOMAIN_CONFIG
        );
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl PurposeLookup for HttpPurposeLookup {
    async fn lookup(&self, domain: &DomainName) -> Result<DomainPurpose, LookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[(query::DOMAIN, domain.as_ref())])
            .header(ACCEPT, content_types::JSON)
            .header(X_API_KEY, self.api_key.as_ref())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let body = response.bytes().await?;
        let config: DomainConfigResponse = serde_json::from_slice(&body)?;
        if config.found == Some(false) {
            debug!(domain = %domain, "Domain is not registered with the configuration backend");
        }

        Ok(config.purpose())
    }
}

/// Result of resolving a domain
#[derive(Debug)]
pub enum Resolution {
    Resolved(DomainPurpose),
    Unresolved(LookupError),
}

impl Resolution {
    /// The purpose to route with; unresolved domains are treated as links
    pub fn purpose(&self) -> DomainPurpose {
        match self {
            Self::Resolved(purpose) => *purpose,
            Self::Unresolved(_) => DomainPurpose::default(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Resolves a domain's purpose through the cache and the remote lookup
pub struct DomainPurposeResolver {
    cache: Arc<DomainPurposeCache>,
    lookup: Arc<dyn PurposeLookup>,
    clock: Arc<dyn Clock>,
}

impl DomainPurposeResolver {
    pub fn new(cache: Arc<DomainPurposeCache>, lookup: Arc<dyn PurposeLookup>) -> Self {
        Self::with_clock(cache, lookup, Arc::new(SystemClock))
    }

    pub fn with_clock(
        cache: Arc<DomainPurposeCache>,
        lookup: Arc<dyn PurposeLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache,
            lookup,
            clock,
        }
    }

    pub fn cache(&self) -> &Arc<DomainPurposeCache> {
        &self.cache
    }

    /// Resolve a domain to the purpose used for routing
    pub async fn resolve(&self, domain: &DomainName) -> DomainPurpose {
        self.resolve_detailed(domain).await.purpose()
    }

    /// Resolve a raw host; hosts that are not valid domain names stay unresolved
    pub async fn resolve_host(&self, host: &str) -> Resolution {
        match DomainName::try_new(host) {
            Ok(domain) => self.resolve_detailed(&domain).await,
            Err(_) => {
                debug!(host, "Host is not a valid domain name; skipping lookup");
                Resolution::Unresolved(LookupError::InvalidDomain(host.to_string()))
            }
        }
    }

    #[instrument(skip_all, fields(domain = %domain))]
    pub async fn resolve_detailed(&self, domain: &DomainName) -> Resolution {
        if let Some(purpose) = self.cache.get(domain, self.clock.now()) {
            debug!(%purpose, "Domain purpose cache hit");
            return Resolution::Resolved(purpose);
        }

        match self.lookup.lookup(domain).await {
            Ok(purpose) => {
                let write = self.cache.put(domain.clone(), purpose, self.clock.now());
                debug!(%purpose, ?write, "Domain purpose resolved");
                Resolution::Resolved(purpose)
            }
            Err(error) => {
                warn!(%error, "Domain purpose lookup failed; routing as links");
                Resolution::Unresolved(error)
            }
        }
    }
}
