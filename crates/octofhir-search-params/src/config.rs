use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::UtcOffset;
use time::macros::format_description;

use crate::common::builtin_dictionary;
use crate::error::ConfigError;
use crate::registry::SearchParameterDictionary;

/// What to do with query parameters that are not in the dictionary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownParameterPolicy {
    /// Skip them; the rest of the query still applies
    #[default]
    Ignore,
    /// Record them as failures, so strict assembly rejects the query
    Reject,
}

/// Search compilation settings.
///
/// ```toml
/// unknown_parameters = "ignore"
/// local_offset = "+00:00"
/// dictionary = "search-params.toml"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub unknown_parameters: UnknownParameterPolicy,
    /// Offset for dates written without a zone, `Z` or `±hh:mm`
    #[serde(default = "default_local_offset")]
    pub local_offset: String,
    /// Dictionary file (TOML or JSON); the built-in dictionary when absent
    #[serde(default)]
    pub dictionary: Option<PathBuf>,
}

fn default_local_offset() -> String {
    "+00:00".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            unknown_parameters: UnknownParameterPolicy::default(),
            local_offset: default_local_offset(),
            dictionary: None,
        }
    }
}

impl SearchConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file. A relative dictionary path is resolved against
    /// the directory of the config file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        if let Some(dictionary) = config.dictionary.take() {
            let resolved = match path.parent() {
                Some(dir) if dictionary.is_relative() => dir.join(dictionary),
                _ => dictionary,
            };
            config.dictionary = Some(resolved);
        }
        tracing::debug!(path = %path.display(), "Loaded search config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.local_offset().map(|_| ())
    }

    /// The configured local offset.
    pub fn local_offset(&self) -> Result<UtcOffset, ConfigError> {
        parse_offset(&self.local_offset)
    }

    /// Load the configured dictionary, or build the built-in one.
    pub fn dictionary(&self) -> Result<SearchParameterDictionary, ConfigError> {
        match &self.dictionary {
            Some(path) => Ok(SearchParameterDictionary::load_from_file(path)?),
            None => Ok(builtin_dictionary()),
        }
    }
}

/// Parse `Z` or `±hh:mm`.
pub fn parse_offset(s: &str) -> Result<UtcOffset, ConfigError> {
    if s == "Z" {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(
        s,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(|_| ConfigError::InvalidOffset(s.to_string()))
}
