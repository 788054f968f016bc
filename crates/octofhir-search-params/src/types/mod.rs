//! Typed search values.
//!
//! One parser per FHIR search parameter type:
//! - Date: calendar range at the written precision
//! - Number: exact rational range at the written precision
//! - Quantity: number plus optional system and code
//! - Reference: URL, `Type/id` or bare id
//! - String: case-insensitive prefix match
//! - Token: optional system plus code
//! - URI: exact match
//!
//! Composite and special parameters have no value parser.

pub mod date;
pub mod number;
pub mod quantity;
pub mod reference;
pub mod string;
pub mod token;
pub mod uri;

use std::fmt;

pub use date::{DatePrecision, DateRange, DateValue, DateZone};
pub use number::{NumberValue, to_decimal_string};
pub use quantity::QuantityValue;
pub use reference::ReferenceValue;
pub use string::StringValue;
pub use token::TokenValue;
pub use uri::UriValue;

use crate::error::ParseError;
use crate::parameters::{SearchParameterType, SearchPrefix};

/// A parsed search value of any supported type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchValue {
    Date(DateValue),
    Number(NumberValue),
    Quantity(QuantityValue),
    Reference(ReferenceValue),
    String(StringValue),
    Token(TokenValue),
    Uri(UriValue),
}

impl SearchValue {
    /// Parse `raw` with the parser for `param_type`.
    ///
    /// Returns `Ok(None)` for composite and special parameters.
    pub fn parse(param_type: SearchParameterType, raw: &str) -> Result<Option<Self>, ParseError> {
        let value = match param_type {
            SearchParameterType::Date => Self::Date(DateValue::parse(raw)?),
            SearchParameterType::Number => Self::Number(NumberValue::parse(raw)?),
            SearchParameterType::Quantity => Self::Quantity(QuantityValue::parse(raw)?),
            SearchParameterType::Reference => Self::Reference(ReferenceValue::parse(raw)),
            SearchParameterType::String => Self::String(StringValue::parse(raw)),
            SearchParameterType::Token => Self::Token(TokenValue::parse(raw)),
            SearchParameterType::Uri => Self::Uri(UriValue::parse(raw)),
            SearchParameterType::Composite | SearchParameterType::Special => return Ok(None),
        };
        Ok(Some(value))
    }

    pub fn param_type(&self) -> SearchParameterType {
        match self {
            Self::Date(_) => SearchParameterType::Date,
            Self::Number(_) => SearchParameterType::Number,
            Self::Quantity(_) => SearchParameterType::Quantity,
            Self::Reference(_) => SearchParameterType::Reference,
            Self::String(_) => SearchParameterType::String,
            Self::Token(_) => SearchParameterType::Token,
            Self::Uri(_) => SearchParameterType::Uri,
        }
    }

    /// The comparison prefix; `Eq` for types that take none.
    pub fn prefix(&self) -> SearchPrefix {
        match self {
            Self::Date(v) => v.prefix,
            Self::Number(v) => v.prefix,
            Self::Quantity(v) => v.prefix,
            _ => SearchPrefix::Eq,
        }
    }
}

impl fmt::Display for SearchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(v) => v.fmt(f),
            Self::Number(v) => v.fmt(f),
            Self::Quantity(v) => v.fmt(f),
            Self::Reference(v) => v.fmt(f),
            Self::String(v) => v.fmt(f),
            Self::Token(v) => v.fmt(f),
            Self::Uri(v) => v.fmt(f),
        }
    }
}
