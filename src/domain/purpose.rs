//! Classification of a host into the backend family that serves it

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Which backend family handles requests for a given host
///
/// `Links` is the default whenever a host is unknown or could not be
/// resolved, so an unresolved host is always treated as a short-link domain.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum DomainPurpose {
    /// Short codes on this host resolve to redirects
    #[default]
    #[display("links")]
    Links,
    /// Paths on this host render biopages
    #[display("biopage")]
    Biopage,
}

impl DomainPurpose {
    pub const LINKS: &'static str = "links";
    pub const BIOPAGE: &'static str = "biopage";

    /// Interpret the `purpose` field reported by the domain-configuration
    /// backend. Anything other than `biopage` maps to `Links`.
    pub fn from_wire(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case(Self::BIOPAGE) {
            Self::Biopage
        } else {
            Self::Links
        }
    }
}
