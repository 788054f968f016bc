use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::DictionaryError;

/// FHIR SearchParameter type enumeration
/// See: https://hl7.org/fhir/search.html#table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchParameterType {
    Number,
    Date,
    String,
    Token,
    Reference,
    Composite,
    Quantity,
    Uri,
    Special,
}

impl SearchParameterType {
    /// Parse a search parameter type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "string" => Some(Self::String),
            "token" => Some(Self::Token),
            "reference" => Some(Self::Reference),
            "composite" => Some(Self::Composite),
            "quantity" => Some(Self::Quantity),
            "uri" => Some(Self::Uri),
            "special" => Some(Self::Special),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Date => "date",
            Self::String => "string",
            Self::Token => "token",
            Self::Reference => "reference",
            Self::Composite => "composite",
            Self::Quantity => "quantity",
            Self::Uri => "uri",
            Self::Special => "special",
        }
    }

    /// Whether values of this type may start with a comparison prefix.
    pub fn is_ordered(&self) -> bool {
        matches!(self, Self::Number | Self::Date | Self::Quantity)
    }
}

impl fmt::Display for SearchParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefixes for number/date/quantity search values
/// e.g., `ge2020-01-01`, `lt5.0`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchPrefix {
    #[default]
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Ap, // approximately
}

impl fmt::Display for SearchPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl SearchPrefix {
    /// Extraction order. `Eq` comes first and is also the fallback.
    pub const ALL: [SearchPrefix; 7] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Lt,
        Self::Ge,
        Self::Le,
        Self::Ap,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            SearchPrefix::Eq => "eq",
            SearchPrefix::Ne => "ne",
            SearchPrefix::Gt => "gt",
            SearchPrefix::Lt => "lt",
            SearchPrefix::Ge => "ge",
            SearchPrefix::Le => "le",
            SearchPrefix::Ap => "ap",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == s)
    }

    /// Split a leading two-letter prefix off a raw value.
    ///
    /// The first prefix (in [`SearchPrefix::ALL`] order) whose code starts the
    /// value wins. Without a match the whole value is returned with `Eq`. The
    /// remainder is not validated.
    pub fn extract(raw: &str) -> (Self, &str) {
        for prefix in Self::ALL {
            if let Some(rest) = raw.strip_prefix(prefix.code()) {
                return (prefix, rest);
            }
        }
        (Self::Eq, raw)
    }
}

/// The structured kind of value stored at a search path.
///
/// Token search inspects different sub-fields depending on the shape, so the
/// dictionary records one shape per path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PathShape {
    Coding,
    CodeableConcept,
    Identifier,
    ContactPoint,
    Reference,
    Quantity,
    /// A FHIR primitive (`code`, `string`, `boolean`, `dateTime`, ...).
    Scalar(String),
}

/// FHIR primitive type names accepted as [`PathShape::Scalar`].
const PRIMITIVE_TYPES: &[&str] = &[
    "base64Binary",
    "boolean",
    "canonical",
    "code",
    "date",
    "dateTime",
    "decimal",
    "id",
    "instant",
    "integer",
    "markdown",
    "oid",
    "positiveInt",
    "string",
    "time",
    "unsignedInt",
    "uri",
    "url",
    "uuid",
];

impl PathShape {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Coding => "Coding",
            Self::CodeableConcept => "CodeableConcept",
            Self::Identifier => "Identifier",
            Self::ContactPoint => "ContactPoint",
            Self::Reference => "Reference",
            Self::Quantity => "Quantity",
            Self::Scalar(name) => name,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }
}

impl FromStr for PathShape {
    type Err = DictionaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Coding" => Ok(Self::Coding),
            "CodeableConcept" => Ok(Self::CodeableConcept),
            "Identifier" => Ok(Self::Identifier),
            "ContactPoint" => Ok(Self::ContactPoint),
            "Reference" => Ok(Self::Reference),
            "Quantity" => Ok(Self::Quantity),
            other if PRIMITIVE_TYPES.contains(&other) => Ok(Self::Scalar(other.to_string())),
            other => Err(DictionaryError::UnknownShape(other.to_string())),
        }
    }
}

impl TryFrom<String> for PathShape {
    type Error = DictionaryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PathShape> for String {
    fn from(shape: PathShape) -> Self {
        shape.as_str().to_string()
    }
}

impl fmt::Display for PathShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dictionary metadata for one search parameter of one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParamInfo {
    /// The code used in search queries (e.g., "code", "patient")
    pub name: String,
    /// The declared type, which selects the value parser
    #[serde(rename = "type")]
    pub param_type: SearchParameterType,
    /// Field paths the parameter matches against, in declaration order
    pub paths: IndexMap<String, PathShape>,
}

impl SearchParamInfo {
    pub fn new(name: impl Into<String>, param_type: SearchParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            paths: IndexMap::new(),
        }
    }

    /// Add a path with its underlying shape.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>, shape: PathShape) -> Self {
        self.paths.insert(path.into(), shape);
        self
    }

    /// Get this parameter as an Arc for shared ownership.
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_each_prefix() {
        for prefix in SearchPrefix::ALL {
            let raw = format!("{}10", prefix.code());
            assert_eq!(SearchPrefix::extract(&raw), (prefix, "10"));
        }
    }

    #[test]
    fn test_extract_defaults_to_eq() {
        assert_eq!(SearchPrefix::extract("2013-01-02"), (SearchPrefix::Eq, "2013-01-02"));
        assert_eq!(SearchPrefix::extract(""), (SearchPrefix::Eq, ""));
        assert_eq!(SearchPrefix::extract("g"), (SearchPrefix::Eq, "g"));
    }

    #[test]
    fn test_extract_is_idempotent_after_reprefixing() {
        for prefix in SearchPrefix::ALL {
            let input = format!("{}10", prefix.code());
            let (_, rest) = SearchPrefix::extract(&input);
            let again = format!("{}{}", prefix.code(), rest);
            assert_eq!(SearchPrefix::extract(&again), (prefix, "10"));
        }
    }

    #[test]
    fn test_extract_does_not_validate_remainder() {
        assert_eq!(SearchPrefix::extract("gtabc"), (SearchPrefix::Gt, "abc"));
        assert_eq!(SearchPrefix::extract("nelt5"), (SearchPrefix::Ne, "lt5"));
        // upper case codes are not prefixes
        assert_eq!(SearchPrefix::extract("GT5"), (SearchPrefix::Eq, "GT5"));
    }

    #[test]
    fn test_prefix_display_and_parse() {
        assert_eq!(SearchPrefix::Ap.to_string(), "ap");
        assert_eq!(SearchPrefix::parse("le"), Some(SearchPrefix::Le));
        assert_eq!(SearchPrefix::parse("sa"), None);
    }

    #[test]
    fn test_parameter_type_parse() {
        assert_eq!(SearchParameterType::parse("token"), Some(SearchParameterType::Token));
        assert_eq!(SearchParameterType::parse("Token"), None);
        assert!(SearchParameterType::Date.is_ordered());
        assert!(!SearchParameterType::Uri.is_ordered());
    }

    #[test]
    fn test_path_shape_parse() {
        assert_eq!("Coding".parse::<PathShape>().unwrap(), PathShape::Coding);
        assert_eq!(
            "code".parse::<PathShape>().unwrap(),
            PathShape::Scalar("code".to_string())
        );
        assert!(matches!(
            "Widget".parse::<PathShape>(),
            Err(DictionaryError::UnknownShape(name)) if name == "Widget"
        ));
    }

    #[test]
    fn test_param_info_keeps_path_order() {
        let info = SearchParamInfo::new("name", SearchParameterType::String)
            .with_path("name.family", PathShape::Scalar("string".into()))
            .with_path("name.given", PathShape::Scalar("string".into()));
        let paths: Vec<_> = info.paths.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["name.family", "name.given"]);
    }
}
