//! Main edge service implementation
//!
//! The `EdgeService` wires the pipeline together:
//!
//! ```text
//! Request Gate -> Domain Purpose Resolver -> Target Router -> Forwarder -> client
//! ```
//!
//! ## Service Lifecycle
//!
//! ```rust,ignore
//! use edge_router::proxy::{EdgeConfig, EdgeService};
//!
//! let service = EdgeService::new(EdgeConfig::default())?;
//! let router = service.into_router();
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```
//!
//! Errors raised after the gate are returned as [`ProxyError`] and turned
//! into the fallback page in exactly one place, its `IntoResponse` impl.

use crate::proxy::cache::DomainPurposeCache;
use crate::proxy::fallback::not_found_response;
use crate::proxy::forwarder::Forwarder;
use crate::proxy::gate::{GateDecision, RequestGate};
use crate::proxy::headers::paths;
use crate::proxy::middleware::apply_middleware;
use crate::proxy::resolver::{DomainPurposeResolver, HttpPurposeLookup, PurposeLookup};
use crate::proxy::router::TargetRouter;
use crate::proxy::types::*;
use axum::{
    extract::{Request, State},
    response::Response,
    routing::get,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// The edge handler and everything it depends on
pub struct EdgeService {
    gate: RequestGate,
    resolver: DomainPurposeResolver,
    router: TargetRouter,
    forwarder: Forwarder,
}

impl EdgeService {
    /// Create a new edge service talking to the backends over HTTP
    pub fn new(config: EdgeConfig) -> ProxyResult<Self> {
        // Redirects must reach the client untouched, so the client never follows them
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let lookup: Arc<dyn PurposeLookup> = Arc::new(HttpPurposeLookup::new(
            client.clone(),
            &config.base_url,
            config.api_key.clone(),
        ));
        let cache = Arc::new(DomainPurposeCache::new(config.cache_ttl));

        Ok(Self {
            gate: RequestGate::new(config.ignored_prefixes),
            resolver: DomainPurposeResolver::new(cache, lookup),
            router: TargetRouter::new(&config.base_url, &config.api_key)?,
            forwarder: Forwarder::new(client),
        })
    }

    /// Assemble a service from already-built components
    pub fn from_components(
        gate: RequestGate,
        resolver: DomainPurposeResolver,
        router: TargetRouter,
        forwarder: Forwarder,
    ) -> Self {
        Self {
            gate,
            resolver,
            router,
            forwarder,
        }
    }

    pub fn resolver(&self) -> &DomainPurposeResolver {
        &self.resolver
    }

    /// Serve one request
    #[instrument(skip_all, fields(host = %context.host(), path = %context.path()))]
    pub async fn handle(&self, context: &ProxyRequestContext) -> ProxyResult<Response> {
        if let GateDecision::Reject(reason) = self.gate.check(context.path()) {
            debug!(?reason, "Request stopped at the gate");
            return Ok(not_found_response());
        }

        let resolution = self.resolver.resolve_host(context.host()).await;
        let purpose = resolution.purpose();
        debug!(%purpose, resolved = resolution.is_resolved(), "Routing request");

        let target = self.router.route(purpose, context)?;
        self.forwarder.forward(target).await
    }

    /// Create an Axum router for the edge service with middleware
    pub fn into_router(self) -> axum::Router {
        let router = axum::Router::new()
            .route(paths::HEALTH, get(health_handler))
            .fallback(edge_handler)
            .with_state(Arc::new(self));

        apply_middleware(router)
    }
}

/// Axum handler for every non-health request
async fn edge_handler(
    State(edge): State<Arc<EdgeService>>,
    request: Request,
) -> Result<Response, ProxyError> {
    let context = ProxyRequestContext::from_request_parts(request.uri(), request.headers());
    edge.handle(&context).await
}

/// Health check handler
async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainPurpose;
    use crate::proxy::test_utils::test_helpers::*;
    use axum::http::StatusCode;
    use mockito::{Matcher, Server};

    fn service_with(lookup: Arc<CountingLookup>, base_url: &str) -> EdgeService {
        let base_url = UpstreamBaseUrl::try_new(base_url).unwrap();
        let cache = Arc::new(DomainPurposeCache::new(std::time::Duration::from_secs(300)));
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        EdgeService::from_components(
            RequestGate::default(),
            DomainPurposeResolver::new(cache, lookup),
            TargetRouter::new(&base_url, &test_api_key()).unwrap(),
            Forwarder::new(client),
        )
    }

    fn context(host: &str, path: &str) -> ProxyRequestContext {
        let request = edge_request(host, path);
        ProxyRequestContext::from_request_parts(request.uri(), request.headers())
    }

    #[tokio::test]
    async fn test_gated_path_skips_resolution() {
        let lookup = Arc::new(CountingLookup::answering(DomainPurpose::Biopage));
        let service = service_with(lookup.clone(), &unreachable_base_url());

        let response = service
            .handle(&context("bio.example.com", "/robots.txt"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_host_routes_as_links_without_lookup() {
        let mut server = Server::new_async().await;
        let redirect = server
            .mock("GET", "/api/redirect")
            .match_query(Matcher::UrlEncoded("code".into(), "abc".into()))
            .with_status(302)
            .with_header("location", "https://example.com")
            .expect(1)
            .create_async()
            .await;
        let lookup = Arc::new(CountingLookup::answering(DomainPurpose::Biopage));
        let service = service_with(lookup.clone(), &server.url());

        let response = service.handle(&context("bad_host!", "/abc")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(lookup.calls(), 0);
        redirect.assert_async().await;
    }

    #[tokio::test]
    async fn test_forward_failure_is_an_error() {
        let lookup = Arc::new(CountingLookup::failing());
        let service = service_with(lookup.clone(), &unreachable_base_url());

        let result = service.handle(&context("go.example.com", "/abc")).await;

        assert!(matches!(result, Err(ProxyError::Upstream(_))));
        assert_eq!(lookup.calls(), 1);
        assert!(service.resolver().cache().is_empty());
    }
}
