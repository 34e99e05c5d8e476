//! Request gate: drops asset probes before any network call is made

/// Path prefixes that never reach a backend
pub const DEFAULT_IGNORED_PREFIXES: &[&str] = &[
    "favicon",
    "robots.txt",
    "sitemap.xml",
    ".well-known",
    "_next",
    "static/",
];

/// Outcome of checking a path against the gate
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Reject(RejectReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    EmptyPath,
    IgnoredPrefix(String),
}

/// Filters requests for static or ignored paths
#[derive(Clone, Debug)]
pub struct RequestGate {
    ignored_prefixes: Vec<String>,
}

impl RequestGate {
    pub fn new(ignored_prefixes: Vec<String>) -> Self {
        Self { ignored_prefixes }
    }

    /// Check a path whose leading `/` has already been stripped
    pub fn check(&self, path: &str) -> GateDecision {
        if path.is_empty() {
            return GateDecision::Reject(RejectReason::EmptyPath);
        }

        match self
            .ignored_prefixes
            .iter()
            .find(|prefix| path.starts_with(prefix.as_str()))
        {
            Some(prefix) => GateDecision::Reject(RejectReason::IgnoredPrefix(prefix.clone())),
            None => GateDecision::Pass,
        }
    }
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new(
            DEFAULT_IGNORED_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("favicon.ico", "favicon")]
    #[case("favicon-32x32.png", "favicon")]
    #[case("robots.txt", "robots.txt")]
    #[case("sitemap.xml", "sitemap.xml")]
    #[case(".well-known/apple-app-site-association", ".well-known")]
    #[case("_next/static/chunks/main.js", "_next")]
    #[case("static/logo.svg", "static/")]
    fn test_ignored_paths_are_rejected(#[case] path: &str, #[case] prefix: &str) {
        let gate = RequestGate::default();
        assert_eq!(
            gate.check(path),
            GateDecision::Reject(RejectReason::IgnoredPrefix(prefix.to_string()))
        );
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let gate = RequestGate::default();
        assert_eq!(
            gate.check(""),
            GateDecision::Reject(RejectReason::EmptyPath)
        );
    }

    #[rstest]
    #[case("summer-sale")]
    #[case("alice")]
    #[case("staticky")]
    #[case("promo/favicon")]
    #[case("caf%C3%A9")]
    fn test_regular_paths_pass(#[case] path: &str) {
        assert_eq!(RequestGate::default().check(path), GateDecision::Pass);
    }

    #[test]
    fn test_custom_prefix_list() {
        let gate = RequestGate::new(vec!["assets/".to_string()]);
        assert!(matches!(gate.check("assets/app.css"), GateDecision::Reject(_)));
        assert_eq!(gate.check("favicon.ico"), GateDecision::Pass);
    }
}
