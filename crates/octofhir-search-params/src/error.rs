use std::path::PathBuf;

use thiserror::Error;

use crate::parameters::{PathShape, SearchParameterType};

/// Errors produced while parsing a single search value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("Date '{0}' is outside the supported calendar range")]
    DateOutOfRange(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}

impl ParseError {
    pub fn invalid_date(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors produced while compiling a bound parameter into a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Search parameter type '{0}' is not supported")]
    UnsupportedType(SearchParameterType),

    #[error("Cannot apply {param_type} search to path '{path}' of shape {shape}")]
    UnsupportedShape {
        param_type: SearchParameterType,
        path: String,
        shape: PathShape,
    },

    #[error("Search parameter '{0}' declares no paths")]
    NoPaths(String),
}

/// Errors produced while loading a search parameter dictionary.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Failed to read dictionary file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML dictionary: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON dictionary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown path shape '{0}'")]
    UnknownShape(String),

    #[error("Search parameter '{resource_type}.{name}' declares no paths")]
    EmptyPaths { resource_type: String, name: String },

    #[error("Unsupported dictionary format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Errors produced while loading search configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid UTC offset '{0}', expected Z or ±hh:mm")]
    InvalidOffset(String),

    #[error("Failed to load dictionary: {0}")]
    Dictionary(#[from] DictionaryError),
}

/// Per-parameter failure recorded by the query compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Unknown search parameter: {0}")]
    UnknownParameter(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Failure of strict (all-or-nothing) query assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Search parameter '{name}={value}' failed: {source}")]
pub struct QueryError {
    pub name: String,
    pub value: String,
    #[source]
    pub source: SearchError,
}
