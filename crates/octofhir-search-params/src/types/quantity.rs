//! Quantity search values: `[prefix]number[|system|code]`.
//!
//! - `5.4` - value only
//! - `5.4|http://unitsofmeasure.org|mg` - value with system and code
//! - `5.4||mg` - value with code, system explicitly empty
//!
//! The prefix is read once for the whole value, before the `|` split.

use std::fmt;

use crate::error::ParseError;
use crate::escape::{escape, split_unescaped, unescape};
use crate::parameters::SearchPrefix;
use crate::types::number::NumberValue;

/// A parsed quantity search value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityValue {
    pub prefix: SearchPrefix,
    pub number: NumberValue,
    /// `None` unless all three parts were given
    pub system: Option<String>,
    /// `None` unless all three parts were given
    pub code: Option<String>,
}

impl QuantityValue {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let (prefix, value) = SearchPrefix::extract(raw);
        let parts = split_unescaped(value, b'|');

        let number = NumberValue::parse(parts[0]).map_err(|e| match e {
            ParseError::InvalidNumber(_) => ParseError::InvalidQuantity(value.to_string()),
            other => other,
        })?;

        let (system, code) = if parts.len() == 3 {
            (Some(unescape(parts[1])), Some(unescape(parts[2])))
        } else {
            (None, None)
        };

        Ok(Self {
            prefix,
            number,
            system,
            code,
        })
    }

    /// System, if given and non-empty.
    pub fn system(&self) -> Option<&str> {
        self.system.as_deref().filter(|s| !s.is_empty())
    }

    /// Code, if given and non-empty.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref().filter(|s| !s.is_empty())
    }
}

impl fmt::Display for QuantityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix != SearchPrefix::Eq {
            write!(f, "{}", self.prefix)?;
        }
        write!(
            f,
            "{}|{}|{}",
            self.number,
            escape(self.system.as_deref().unwrap_or_default()),
            escape(self.code.as_deref().unwrap_or_default())
        )
    }
}
