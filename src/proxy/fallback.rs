//! Failure responder: the fixed page served when resolution or forwarding fails
//!
//! The page is fully inline (markup, styles and the reload action) so it
//! renders even when nothing else in the backend ecosystem is reachable.

use crate::proxy::headers::{cache_directives, content_types, CACHE_CONTROL, CONTENT_TYPE};
use crate::proxy::types::ProxyError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

pub const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="robots" content="noindex">
<title>Temporarily unavailable</title>
<style>
  :root { color-scheme: light dark; }
  body {
    margin: 0;
    min-height: 100vh;
    display: flex;
    align-items: center;
    justify-content: center;
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background: linear-gradient(135deg, #f5f7fa 0%, #e4e8f0 100%);
    color: #1f2933;
  }
  .card {
    max-width: 420px;
    margin: 24px;
    padding: 40px 32px;
    border-radius: 16px;
    background: #ffffff;
    box-shadow: 0 10px 30px rgba(15, 23, 42, 0.08);
    text-align: center;
  }
  h1 { margin: 0 0 12px; font-size: 1.5rem; }
  p { margin: 0 0 28px; line-height: 1.5; color: #52606d; }
  button {
    padding: 12px 28px;
    border: 0;
    border-radius: 999px;
    background: #1f2933;
    color: #ffffff;
    font-size: 1rem;
    cursor: pointer;
  }
  button:hover { background: #323f4b; }
  @media (prefers-color-scheme: dark) {
    body { background: #111827; color: #f3f4f6; }
    .card { background: #1f2937; box-shadow: none; }
    p { color: #9ca3af; }
    button { background: #f3f4f6; color: #111827; }
  }
</style>
</head>
<body>
<main class="card">
  <h1>We'll be right back</h1>
  <p>This page is temporarily unavailable. Please try again in a moment.</p>
  <button type="button" onclick="location.reload()">Try again</button>
</main>
</body>
</html>
"#;

/// 503 with the self-contained fallback page
pub fn fallback_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [
            (CONTENT_TYPE, content_types::HTML_UTF8),
            (CACHE_CONTROL, cache_directives::NO_STORE),
        ],
        FALLBACK_PAGE,
    )
        .into_response()
}

/// 404 for paths stopped by the request gate
pub fn not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(CACHE_CONTROL, cache_directives::NO_STORE)],
        "Not Found",
    )
        .into_response()
}

/// Every request-path error funnels through here, so a client never sees a
/// partial or garbled response
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error!(error = %self, "Edge request failed; serving fallback page");
        fallback_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_fallback_response_is_503_html() {
        let response = fallback_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(body_string(response).await, FALLBACK_PAGE);
    }

    #[test]
    fn test_fallback_page_is_self_contained() {
        assert!(FALLBACK_PAGE.contains("location.reload()"));
        assert!(!FALLBACK_PAGE.contains("<link"));
        assert!(!FALLBACK_PAGE.contains("<script src"));
        assert!(!FALLBACK_PAGE.contains("<img"));
        assert!(!FALLBACK_PAGE.contains("url("));
    }

    #[tokio::test]
    async fn test_every_proxy_error_becomes_the_fallback_page() {
        let errors = vec![
            ProxyError::InvalidTargetUrl("bad".to_string()),
            ProxyError::InvalidHeader {
                name: "x-api-key".to_string(),
            },
        ];

        for error in errors {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body_string(response).await, FALLBACK_PAGE);
        }
    }

    #[test]
    fn test_not_found_response() {
        let response = not_found_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
