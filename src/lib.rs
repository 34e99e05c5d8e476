//! Edge Router - an edge reverse proxy for link and biopage domains
//!
//! Each inbound host is resolved to its purpose (link redirects or a
//! biopage) through a TTL-cached lookup, and the request is forwarded to
//! the matching backend. Redirects and content are relayed to the client;
//! any failure is answered with a self-contained fallback page.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod proxy;

pub use application::Application;
pub use error::{Error, Result};
