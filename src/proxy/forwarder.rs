//! Forwarding of a routed request to its backend
//!
//! One GET per request, no retries. Redirects are passed through with the
//! upstream's exact status and location and their bodies are never read.
//! Any other response is read in full and relayed under
//! [`CLIENT_RESPONSE_RULES`].

use crate::proxy::headers::{apply_rules, CLIENT_RESPONSE_RULES, LOCATION};
use crate::proxy::router::UpstreamTarget;
use crate::proxy::types::ProxyResult;
use axum::body::Body;
use axum::response::Response;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Executes upstream calls and relays their responses
#[derive(Clone, Debug)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// `client` must be built with redirect following disabled
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    #[instrument(skip_all, fields(url = %target.url().path()))]
    pub async fn forward(&self, target: UpstreamTarget) -> ProxyResult<Response> {
        let start_time = Instant::now();
        let (url, headers) = target.into_parts();

        let upstream = self.client.get(url).headers(headers).send().await?;
        let status = upstream.status();

        if status.is_redirection() {
            if let Some(location) = upstream.headers().get(LOCATION).cloned() {
                debug!(
                    status = status.as_u16(),
                    duration_ms = start_time.elapsed().as_millis(),
                    "Relaying upstream redirect"
                );
                return redirect_response(status, location);
            }
        }

        let upstream_headers = upstream.headers().clone();
        let body = upstream.bytes().await?;

        info!(
            status = status.as_u16(),
            body_bytes = body.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Upstream response relayed"
        );

        Ok(content_response(status, &upstream_headers, body))
    }
}

/// Redirect with the upstream's status and location and an empty body
pub fn redirect_response(status: StatusCode, location: HeaderValue) -> ProxyResult<Response> {
    Ok(Response::builder()
        .status(status)
        .header(LOCATION, location)
        .body(Body::empty())?)
}

/// Buffered content response with the client header policy applied
pub fn content_response(status: StatusCode, upstream_headers: &HeaderMap, body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    apply_rules(&CLIENT_RESPONSE_RULES, upstream_headers, response.headers_mut());
    response
}
