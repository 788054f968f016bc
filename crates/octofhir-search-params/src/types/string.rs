//! String search values.
//!
//! Matching is case-insensitive. Most parameters match when the stored
//! value starts with the search value; `_id` requires the whole value.

use std::fmt;

use crate::escape::unescape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringValue {
    pub value: String,
}

impl StringValue {
    pub fn parse(raw: &str) -> Self {
        Self {
            value: unescape(raw),
        }
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value() {
        assert_eq!(StringValue::parse("Smith").value, "Smith");
    }

    #[test]
    fn test_escapes_resolved() {
        assert_eq!(StringValue::parse(r"Smith\, John").value, "Smith, John");
        assert_eq!(StringValue::parse(r"a\\b").value, r"a\b");
    }
}
