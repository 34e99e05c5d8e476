//! Edge proxy for link and biopage domains
//!
//! Every inbound request flows through one pipeline:
//! - Gate: asset and framework paths are rejected without outbound calls
//! - Resolve: the host's purpose comes from a TTL cache or a remote lookup
//! - Route: the purpose picks the redirect or biopage backend
//! - Forward: the backend response is relayed, redirects included
//!
//! Any failure after the gate is answered with a self-contained 503 page.

pub mod cache;
pub mod fallback;
pub mod forwarder;
pub mod gate;
pub mod headers;
pub mod middleware;
pub mod resolver;
pub mod router;
pub mod service;
pub mod test_utils;
pub mod types;


pub use service::EdgeService;
pub use types::{EdgeConfig, ProxyError, ProxyResult};
