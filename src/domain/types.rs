//! Validated newtypes for values taken from inbound requests

use nutype::nutype;
#[allow(unused_imports)] // These are used by nutype derive macros
use serde::{Deserialize, Serialize};

/// A host name used as the domain-purpose cache key
///
/// Hosts are lower-cased and must already have any port stripped. The
/// 253-character limit is the DNS maximum for a fully qualified name.
#[nutype(
    sanitize(trim, lowercase),
    validate(
        not_empty,
        len_char_max = 253,
        regex = r"^[a-z0-9_]([a-z0-9_.-]*[a-z0-9_])?$"
    ),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct DomainName(String);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("links.example.com")]
    #[case("bio.example.co.uk")]
    #[case("localhost")]
    #[case("my-brand.link")]
    #[case("127.0.0.1")]
    fn test_valid_domain_names(#[case] raw: &str) {
        assert!(DomainName::try_new(raw).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("-leading.example.com")]
    #[case("trailing.example.com.")]
    #[case("bad host.example.com")]
    #[case("[::1]")]
    fn test_invalid_domain_names(#[case] raw: &str) {
        assert!(DomainName::try_new(raw).is_err());
    }

    #[test]
    fn test_domain_name_is_lowercased() {
        let domain = DomainName::try_new("Links.Example.COM").unwrap();
        assert_eq!(domain.as_ref(), "links.example.com");
    }

    #[test]
    fn test_domain_name_rejects_overlong_names() {
        let label = "a".repeat(63);
        let name = [label.as_str(); 5].join(".");
        assert!(name.len() > 253);
        assert!(DomainName::try_new(name).is_err());
    }
}
