//! Domain name validation and splitting
//!
//! Registrar APIs address a record by its root domain (the registrable
//! domain, always the last two labels) plus the subdomain in front of it.
//!
//! ```text
//! sub.sub.example.com
//! └──┬──┘ └────┬────┘
//! subdomain  root domain
//! ```

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Something before a final dot that ends in an alphanumeric character,
/// followed by an alphabetic TLD of at least two characters.
static FQDN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*[a-zA-Z0-9]\.[a-zA-Z]{2,}$").expect("FQDN pattern is a valid regex")
});

/// Check whether `fqdn` looks like a fully qualified domain name
///
/// Accepts `example.de`, `sub.example.com` and `*.example.com`; rejects
/// the empty string, single labels, consecutive dots before the TLD and
/// TLDs that are shorter than two characters or not alphabetic.
pub fn is_valid_fqdn(fqdn: &str) -> bool {
    FQDN_PATTERN.is_match(fqdn)
}

/// Split `fqdn` into `(subdomain, root_domain)`
///
/// The root domain is the last two labels, the subdomain everything in
/// front of them (empty when there are only two labels). Input with fewer
/// than two labels yields an empty root domain, so callers must run
/// [`is_valid_fqdn`] first.
pub fn split_fqdn(fqdn: &str) -> (String, String) {
    let labels: Vec<&str> = fqdn.split('.').collect();
    if labels.len() < 2 {
        return (String::new(), String::new());
    }

    let boundary = labels.len() - 2;
    (labels[..boundary].join("."), labels[boundary..].join("."))
}

/// A validated domain name, already split for registrar calls
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainName {
    fqdn: String,
    subdomain: String,
    root_domain: String,
}

impl DomainName {
    /// Validate and split a fully qualified domain name
    pub fn parse(fqdn: &str) -> Result<Self> {
        if !is_valid_fqdn(fqdn) {
            return Err(Error::invalid_domain(format!(
                "'{}' is not a valid domain",
                fqdn
            )));
        }

        let (subdomain, root_domain) = split_fqdn(fqdn);
        Ok(Self {
            fqdn: fqdn.to_string(),
            subdomain,
            root_domain,
        })
    }

    /// The full name as configured
    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    /// Labels in front of the root domain (possibly empty)
    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    /// The last two labels
    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fqdn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_names() {
        for fqdn in [
            "example.de",
            "sub.example.com",
            "*.example.com",
            "sub.sub.example.com",
        ] {
            assert!(is_valid_fqdn(fqdn), "{} should be valid", fqdn);
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for fqdn in [
            "",
            "example",
            "example.c",
            "example..com",
            "example.c0m",
            "example.123",
            "example.",
        ] {
            assert!(!is_valid_fqdn(fqdn), "{:?} should be invalid", fqdn);
        }
    }

    #[test]
    fn splits_into_subdomain_and_root() {
        assert_eq!(
            split_fqdn("sub.example.com"),
            ("sub".to_string(), "example.com".to_string())
        );
        assert_eq!(
            split_fqdn("example.com"),
            (String::new(), "example.com".to_string())
        );
        assert_eq!(
            split_fqdn("sub.sub.example.com"),
            ("sub.sub".to_string(), "example.com".to_string())
        );
        assert_eq!(
            split_fqdn("*.example.com"),
            ("*".to_string(), "example.com".to_string())
        );
    }

    #[test]
    fn single_label_yields_empty_root() {
        let (subdomain, root) = split_fqdn("example");
        assert!(subdomain.is_empty());
        assert!(root.is_empty());
    }

    #[test]
    fn parse_rejects_invalid_name() {
        let err = DomainName::parse("example..com").unwrap_err();
        assert!(matches!(err, Error::InvalidDomain(_)));
    }

    #[test]
    fn parse_keeps_parts() {
        let name = DomainName::parse("home.example.org").unwrap();
        assert_eq!(name.subdomain(), "home");
        assert_eq!(name.root_domain(), "example.org");
        assert_eq!(name.to_string(), "home.example.org");
    }
}
