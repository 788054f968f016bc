use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use url::form_urlencoded;

use crate::error::{ParseError, SearchError};
use crate::parameters::{PathShape, SearchParamInfo, SearchParameterType, SearchPrefix};
use crate::registry::SearchParameterDictionary;
use crate::types::SearchValue;

/// One query parameter name with every value given for it, in query order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedParam {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedParameters {
    pub params: Vec<ParsedParam>,
}

impl ParsedParameters {
    /// Total number of values across all names.
    pub fn value_count(&self) -> usize {
        self.params.iter().map(|p| p.values.len()).sum()
    }
}

/// Parse an application/x-www-form-urlencoded query string.
///
/// Names are grouped in first-seen order. Values are URL-decoded but not
/// split on commas, and empty values are dropped.
/// Example: "code=http://snomed.info/sct|123641001&patient=Patient/1"
pub fn parse_query(query: &str) -> ParsedParameters {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        if name.is_empty() {
            continue;
        }
        let values = grouped.entry(name.into_owned()).or_default();
        if !value.is_empty() {
            values.push(value.into_owned());
        }
    }

    ParsedParameters {
        params: grouped
            .into_iter()
            .map(|(name, values)| ParsedParam { name, values })
            .collect(),
    }
}

/// A parsed value joined with its dictionary metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParameter {
    pub name: String,
    pub param_type: SearchParameterType,
    pub paths: IndexMap<String, PathShape>,
    pub value: SearchValue,
    pub prefix: SearchPrefix,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("Unknown search parameter: {0}")]
    UnknownParameter(String),
    #[error("Search parameter type '{0}' is not supported")]
    UnsupportedType(SearchParameterType),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<BindError> for SearchError {
    fn from(err: BindError) -> Self {
        match err {
            BindError::UnknownParameter(name) => SearchError::UnknownParameter(name),
            BindError::UnsupportedType(ty) => {
                SearchError::Compile(crate::error::CompileError::UnsupportedType(ty))
            }
            BindError::Parse(e) => SearchError::Parse(e),
        }
    }
}

/// The result of binding one `name=value` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub raw_value: String,
    pub outcome: Result<BoundParameter, BindError>,
}

/// Bind a single raw value against its dictionary entry.
pub fn bind_value(info: &SearchParamInfo, raw: &str) -> Result<BoundParameter, BindError> {
    let value = SearchValue::parse(info.param_type, raw)?
        .ok_or(BindError::UnsupportedType(info.param_type))?;
    Ok(BoundParameter {
        name: info.name.clone(),
        param_type: info.param_type,
        paths: info.paths.clone(),
        prefix: value.prefix(),
        value,
    })
}

/// Resolve every value of `query` through the dictionary for `resource_type`.
///
/// Produces one binding per value occurrence, in query order. Failures are
/// recorded per binding and never stop the remaining values from binding.
pub fn bind(
    dictionary: &SearchParameterDictionary,
    resource_type: &str,
    query: &str,
) -> Vec<Binding> {
    let parsed = parse_query(query);
    let mut bindings = Vec::with_capacity(parsed.value_count());

    for param in parsed.params {
        let info: Option<Arc<SearchParamInfo>> = dictionary.get(resource_type, &param.name);
        if info.is_none() && param.values.is_empty() {
            // `foo=` still names an unknown parameter
            tracing::debug!(resource_type, name = %param.name, "Unknown search parameter without value");
            bindings.push(Binding {
                name: param.name.clone(),
                raw_value: String::new(),
                outcome: Err(BindError::UnknownParameter(param.name.clone())),
            });
            continue;
        }
        for raw_value in param.values {
            let outcome = match &info {
                Some(info) => bind_value(info, &raw_value),
                None => Err(BindError::UnknownParameter(param.name.clone())),
            };
            match &outcome {
                Ok(bound) => tracing::debug!(
                    resource_type,
                    name = %param.name,
                    value = %bound.value,
                    param_type = %bound.param_type,
                    "Bound search parameter"
                ),
                Err(BindError::Parse(e)) => tracing::warn!(
                    resource_type,
                    name = %param.name,
                    value = %raw_value,
                    error = %e,
                    "Failed to parse search value"
                ),
                Err(e) => tracing::debug!(
                    resource_type,
                    name = %param.name,
                    reason = %e,
                    "Search parameter not bound"
                ),
            }
            bindings.push(Binding {
                name: param.name.clone(),
                raw_value,
                outcome,
            });
        }
    }

    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::builtin_dictionary;
    use crate::types::TokenValue;

    #[test]
    fn test_parse_query_groups_in_first_seen_order() {
        let parsed = parse_query("code=a&patient=Patient/1&code=b");
        assert_eq!(parsed.params.len(), 2);
        assert_eq!(parsed.params[0].name, "code");
        assert_eq!(parsed.params[0].values, vec!["a", "b"]);
        assert_eq!(parsed.params[1].name, "patient");
        assert_eq!(parsed.value_count(), 3);
    }

    #[test]
    fn test_parse_query_decodes_without_comma_split() {
        let parsed = parse_query("?code=http%3A%2F%2Fsnomed.info%2Fsct%7C123&name=a,b");
        assert_eq!(parsed.params[0].values, vec!["http://snomed.info/sct|123"]);
        assert_eq!(parsed.params[1].values, vec!["a,b"]);
    }

    #[test]
    fn test_parse_query_drops_empty_values() {
        let parsed = parse_query("code=&name=x&=y");
        assert_eq!(parsed.params.len(), 2);
        assert!(parsed.params[0].values.is_empty());
        assert_eq!(parsed.value_count(), 1);
    }

    #[test]
    fn test_bind_unknown_name_with_empty_value() {
        let dictionary = builtin_dictionary();
        let bindings = bind(&dictionary, "Condition", "foo=&code=");
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].name, "foo");
        assert_eq!(bindings[0].raw_value, "");
        assert_eq!(
            bindings[0].outcome,
            Err(BindError::UnknownParameter("foo".to_string()))
        );
    }

    #[test]
    fn test_bind_token() {
        let dictionary = builtin_dictionary();
        let bindings = bind(&dictionary, "Condition", "code=http://snomed.info/sct|123641001");
        assert_eq!(bindings.len(), 1);

        let bound = bindings[0].outcome.as_ref().unwrap();
        assert_eq!(bound.param_type, SearchParameterType::Token);
        assert_eq!(bound.prefix, SearchPrefix::Eq);
        assert_eq!(
            bound.value,
            SearchValue::Token(TokenValue::parse("http://snomed.info/sct|123641001"))
        );
        assert_eq!(bound.paths.get("code"), Some(&PathShape::CodeableConcept));
    }

    #[test]
    fn test_bind_prefix_only_for_ordered_types() {
        let dictionary = builtin_dictionary();
        let bindings = bind(&dictionary, "Patient", "birthdate=ge1970-01-01&name=eve");
        assert_eq!(bindings[0].outcome.as_ref().unwrap().prefix, SearchPrefix::Ge);

        let name = bindings[1].outcome.as_ref().unwrap();
        assert_eq!(name.prefix, SearchPrefix::Eq);
        assert_eq!(name.value.to_string(), "eve");
    }

    #[test]
    fn test_bind_records_failures_per_value() {
        let dictionary = builtin_dictionary();
        let bindings = bind(
            &dictionary,
            "Patient",
            "birthdate=garbage&birthdate=2000&unknown=1&gender=female",
        );
        assert_eq!(bindings.len(), 4);
        assert!(matches!(bindings[0].outcome, Err(BindError::Parse(_))));
        assert!(bindings[1].outcome.is_ok());
        assert_eq!(
            bindings[2].outcome,
            Err(BindError::UnknownParameter("unknown".to_string()))
        );
        assert!(bindings[3].outcome.is_ok());
    }

    #[test]
    fn test_bind_composite_unsupported() {
        let dictionary = builtin_dictionary();
        let bindings = bind(&dictionary, "Observation", "code-value-quantity=a$1");
        assert_eq!(
            bindings[0].outcome,
            Err(BindError::UnsupportedType(SearchParameterType::Composite))
        );
    }

    #[test]
    fn test_unknown_resource_type() {
        let dictionary = builtin_dictionary();
        let bindings = bind(&dictionary, "Basic", "code=a");
        assert!(matches!(bindings[0].outcome, Err(BindError::UnknownParameter(_))));
    }
}
