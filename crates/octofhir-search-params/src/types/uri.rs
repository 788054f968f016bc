//! URI search values, matched exactly and case-sensitively.

use std::fmt;

use crate::escape::unescape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriValue {
    pub uri: String,
}

impl UriValue {
    pub fn parse(raw: &str) -> Self {
        Self { uri: unescape(raw) }
    }
}

impl fmt::Display for UriValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}
