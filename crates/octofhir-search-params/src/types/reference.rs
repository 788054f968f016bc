//! Reference search values.
//!
//! The value can be:
//! - An absolute URL: "http://example.org/fhir/Patient/123"
//! - A typed reference: "Patient/123"
//! - An ID only: "123"

use std::fmt;

use crate::escape::unescape;

/// A parsed reference search value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceValue {
    pub reference: String,
}

impl ReferenceValue {
    pub fn parse(raw: &str) -> Self {
        Self {
            reference: unescape(raw),
        }
    }

    /// True when the reference is an absolute URI, i.e. it starts with a
    /// scheme (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`).
    ///
    /// Only the scheme is checked, so `http://` counts as a URL even though
    /// it has no host.
    pub fn is_url(&self) -> bool {
        let Some((scheme, _)) = self.reference.split_once(':') else {
            return false;
        };
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    }

    pub fn url(&self) -> Option<&str> {
        self.is_url().then_some(self.reference.as_str())
    }

    /// The id part of a non-URL reference: everything after the last `/`.
    pub fn id(&self) -> Option<&str> {
        if self.is_url() {
            return None;
        }
        Some(
            self.reference
                .rsplit_once('/')
                .map_or(self.reference.as_str(), |(_, id)| id),
        )
    }

    /// The type part of a non-URL reference: everything before the last `/`.
    pub fn resource_type(&self) -> Option<&str> {
        if self.is_url() {
            return None;
        }
        self.reference.rsplit_once('/').map(|(ty, _)| ty)
    }
}

impl fmt::Display for ReferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_reference() {
        let r = ReferenceValue::parse("Patient/123456789");
        assert!(!r.is_url());
        assert_eq!(r.id(), Some("123456789"));
        assert_eq!(r.resource_type(), Some("Patient"));
        assert_eq!(r.url(), None);
    }

    #[test]
    fn test_bare_id() {
        let r = ReferenceValue::parse("123456789");
        assert!(!r.is_url());
        assert_eq!(r.id(), Some("123456789"));
        assert_eq!(r.resource_type(), None);
    }

    #[test]
    fn test_absolute_url() {
        let r = ReferenceValue::parse("http://acme.com/Patient/123456789");
        assert!(r.is_url());
        assert_eq!(r.url(), Some("http://acme.com/Patient/123456789"));
        assert_eq!(r.id(), None);
        assert_eq!(r.resource_type(), None);
    }

    #[test]
    fn test_urn_is_a_url() {
        let r = ReferenceValue::parse("urn:uuid:53fefa32-fcbb-4ff8-8a92-55ee120877b7");
        assert!(r.is_url());
    }

    #[test]
    fn test_scheme_alone_makes_a_url() {
        let r = ReferenceValue::parse("http://");
        assert!(r.is_url());
        assert_eq!(r.id(), None);
        assert_eq!(r.resource_type(), None);

        // not a valid scheme
        assert!(!ReferenceValue::parse("1abc:x").is_url());
        assert!(!ReferenceValue::parse(":x").is_url());
        assert!(!ReferenceValue::parse("Patient/1:2").is_url());
    }

    #[test]
    fn test_type_keeps_everything_before_last_slash() {
        let r = ReferenceValue::parse("Patient/123/_history/2");
        assert_eq!(r.id(), Some("2"));
        assert_eq!(r.resource_type(), Some("Patient/123/_history"));
    }

    #[test]
    fn test_value_is_unescaped() {
        let r = ReferenceValue::parse(r"Patient/a\,b");
        assert_eq!(r.reference, "Patient/a,b");
        assert_eq!(r.id(), Some("a,b"));
    }
}
