//! Target URL resolution for the backend that serves a request
//!
//! Biopage hosts go to the biopage backend with the path as `slug`. Every
//! other host, including one whose purpose could not be resolved, goes to
//! the redirect backend with the path as `code` and the host as `domain`,
//! because short codes are scoped per domain.

use crate::domain::DomainPurpose;
use crate::proxy::headers::{apply_rules, paths, query, UPSTREAM_REQUEST_RULES, X_API_KEY};
use crate::proxy::types::{ApiKey, ProxyError, ProxyRequestContext, ProxyResult, UpstreamBaseUrl};
use http::{HeaderMap, HeaderValue};
use reqwest::Url;
use urlencoding::encode;

/// A fully built upstream call: where to send it and with which headers
#[derive(Clone, Debug)]
pub struct UpstreamTarget {
    url: Url,
    headers: HeaderMap,
}

impl UpstreamTarget {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn into_parts(self) -> (Url, HeaderMap) {
        (self.url, self.headers)
    }
}

/// Builds upstream targets for resolved requests
#[derive(Clone, Debug)]
pub struct TargetRouter {
    redirect_endpoint: String,
    biopage_endpoint: String,
    api_key: HeaderValue,
}

impl TargetRouter {
    pub fn new(base_url: &UpstreamBaseUrl, api_key: &ApiKey) -> ProxyResult<Self> {
        let base = base_url.as_ref().trim_end_matches('/');
        let mut api_key =
            HeaderValue::from_str(api_key.as_ref()).map_err(|_| ProxyError::InvalidHeader {
                name: X_API_KEY.to_string(),
            })?;
        api_key.set_sensitive(true);

        Ok(Self {
            redirect_endpoint: format!("{base}{}", paths::upstream::REDIRECT),
            biopage_endpoint: format!("{base}{}", paths::upstream::BIOPAGE),
            api_key,
        })
    }

    /// URL of the backend call for `path` on `domain`
    ///
    /// Path and domain are percent-encoded as query values, so decoding the
    /// parameter yields exactly the input.
    pub fn target_url(&self, purpose: DomainPurpose, path: &str, domain: &str) -> ProxyResult<Url> {
        let raw = match purpose {
            DomainPurpose::Biopage => format!(
                "{}?{}={}",
                self.biopage_endpoint,
                query::SLUG,
                encode(path)
            ),
            DomainPurpose::Links => format!(
                "{}?{}={}&{}={}",
                self.redirect_endpoint,
                query::CODE,
                encode(path),
                query::DOMAIN,
                encode(domain)
            ),
        };

        Url::parse(&raw).map_err(|e| ProxyError::InvalidTargetUrl(format!("{raw}: {e}")))
    }

    /// Build the URL and header set for forwarding `context`
    pub fn route(
        &self,
        purpose: DomainPurpose,
        context: &ProxyRequestContext,
    ) -> ProxyResult<UpstreamTarget> {
        let url = self.target_url(purpose, context.path(), context.host())?;

        let mut headers = HeaderMap::new();
        apply_rules(&UPSTREAM_REQUEST_RULES, context, &mut headers);
        headers.insert(X_API_KEY, self.api_key.clone());

        Ok(UpstreamTarget { url, headers })
    }
}
