//! Token search values.
//!
//! Token values can be in the following formats:
//! - `code` - match code in any system
//! - `system|code` - match both system and code
//! - `|code` - match code with an explicitly empty system

use std::fmt;

use crate::escape::{escape, split_unescaped, unescape};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenValue {
    /// Empty when `any_system` is set or when the value starts with `|`
    pub system: String,
    pub code: String,
    /// No `|` separator was present
    pub any_system: bool,
}

impl TokenValue {
    /// Parse a token value.
    ///
    /// The first two unescaped `|`-separated parts are the system and the
    /// code; any further parts are ignored.
    pub fn parse(raw: &str) -> Self {
        let parts = split_unescaped(raw, b'|');
        if parts.len() == 1 {
            return Self {
                system: String::new(),
                code: unescape(raw),
                any_system: true,
            };
        }

        Self {
            system: unescape(parts[0]),
            code: unescape(parts[1]),
            any_system: false,
        }
    }

    /// The system to match, `None` for any system.
    pub fn system(&self) -> Option<&str> {
        (!self.any_system).then_some(self.system.as_str())
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.any_system {
            f.write_str(&escape(&self.code))
        } else {
            write!(f, "{}|{}", escape(&self.system), escape(&self.code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_only() {
        let t = TokenValue::parse("M");
        assert!(t.any_system);
        assert_eq!(t.code, "M");
        assert_eq!(t.system, "");
        assert_eq!(t.system(), None);
    }

    #[test]
    fn test_system_and_code() {
        let t = TokenValue::parse("http://snomed.info/sct|123641001");
        assert!(!t.any_system);
        assert_eq!(t.system(), Some("http://snomed.info/sct"));
        assert_eq!(t.code, "123641001");
        assert_eq!(t.to_string(), "http://snomed.info/sct|123641001");
    }

    #[test]
    fn test_empty_system() {
        let t = TokenValue::parse("|code");
        assert!(!t.any_system);
        assert_eq!(t.system(), Some(""));
        assert_eq!(t.code, "code");
    }

    #[test]
    fn test_escaped_separator_is_part_of_code() {
        let t = TokenValue::parse(r"a\|b");
        assert!(t.any_system);
        assert_eq!(t.code, "a|b");
        assert_eq!(t.to_string(), r"a\|b");
    }

    #[test]
    fn test_extra_separators_are_dropped() {
        let t = TokenValue::parse("sys|a|b");
        assert!(!t.any_system);
        assert_eq!(t.system, "sys");
        assert_eq!(t.code, "a");

        let t = TokenValue::parse(r"sys|a\|b|c");
        assert_eq!(t.code, "a|b");
    }

    #[test]
    fn test_escaped_system() {
        let t = TokenValue::parse(r"urn:x\|y|123");
        assert_eq!(t.system, "urn:x|y");
        assert_eq!(t.code, "123");
    }
}
