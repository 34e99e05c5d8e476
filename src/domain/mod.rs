//! Domain types for the edge router
//!
//! These types describe what a host is used for and validate the values
//! that cross the proxy boundary.

pub mod purpose;
pub mod types;

pub use purpose::DomainPurpose;
pub use types::DomainName;
