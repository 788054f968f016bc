//! Search parameter dictionary for lookup by resource type and name.
//!
//! The dictionary is an explicit object handed to the binder and compiler.
//! Uses DashMap for lock-free concurrent reads, so one dictionary can serve
//! any number of concurrent queries while a loader adds or removes entries.
//!
//! Dictionary files map resource type and parameter name to an entry:
//!
//! ```toml
//! [Condition.code]
//! type = "token"
//! paths = { code = "CodeableConcept" }
//! ```
//!
//! The JSON form has the same structure. Path order is preserved.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DictionaryError;
use crate::parameters::{PathShape, SearchParamInfo, SearchParameterType};

/// One parameter entry as written in a dictionary file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DictionaryEntry {
    #[serde(rename = "type")]
    param_type: SearchParameterType,
    paths: IndexMap<String, PathShape>,
}

/// Resource type -> parameter name -> entry
type DictionaryFile = IndexMap<String, IndexMap<String, DictionaryEntry>>;

/// Search parameter metadata keyed by `(resource_type, name)`.
#[derive(Debug, Default)]
pub struct SearchParameterDictionary {
    by_resource: DashMap<(String, String), Arc<SearchParamInfo>>,
}

impl SearchParameterDictionary {
    /// Create a new empty dictionary.
    pub fn new() -> Self {
        Self {
            by_resource: DashMap::new(),
        }
    }

    /// Register a parameter for a resource type, replacing any previous entry.
    pub fn register(&self, resource_type: impl Into<String>, param: SearchParamInfo) {
        let key = (resource_type.into(), param.name.clone());
        self.by_resource.insert(key, param.into_arc());
    }

    /// Alias for `register()` when doing incremental updates.
    pub fn upsert(&self, resource_type: impl Into<String>, param: SearchParamInfo) {
        self.register(resource_type, param);
    }

    /// Remove a parameter. Returns true if it was present.
    pub fn remove(&self, resource_type: &str, name: &str) -> bool {
        self.by_resource
            .remove(&(resource_type.to_string(), name.to_string()))
            .is_some()
    }

    /// Look up a parameter for a resource type.
    pub fn get(&self, resource_type: &str, name: &str) -> Option<Arc<SearchParamInfo>> {
        let key = (resource_type.to_string(), name.to_string());
        self.by_resource.get(&key).map(|entry| entry.value().clone())
    }

    /// All parameters of a resource type, sorted by name.
    pub fn get_all_for_type(&self, resource_type: &str) -> Vec<Arc<SearchParamInfo>> {
        let mut params: Vec<_> = self
            .by_resource
            .iter()
            .filter(|entry| entry.key().0 == resource_type)
            .map(|entry| entry.value().clone())
            .collect();
        params.sort_by(|a, b| a.name.cmp(&b.name));
        params
    }

    /// Resource types with at least one parameter, sorted.
    pub fn list_resource_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .by_resource
            .iter()
            .map(|entry| entry.key().0.clone())
            .collect();
        types.sort();
        types.dedup();
        types
    }

    /// Get the total number of registered parameters.
    pub fn len(&self) -> usize {
        self.by_resource.len()
    }

    /// Check if the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.by_resource.is_empty()
    }

    /// Parse a dictionary from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, DictionaryError> {
        let file: DictionaryFile = toml::from_str(content)?;
        Self::from_file_entries(file)
    }

    /// Parse a dictionary from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, DictionaryError> {
        let file: DictionaryFile = serde_json::from_str(content)?;
        Self::from_file_entries(file)
    }

    /// Load a dictionary file; the format is chosen by extension
    /// (`.toml` or `.json`).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|ext| ext.to_str());
        let dictionary = match extension {
            Some("toml") => Self::from_toml_str(&std::fs::read_to_string(path)?)?,
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path)?)?,
            _ => return Err(DictionaryError::UnsupportedFormat(path.to_path_buf())),
        };

        tracing::info!(
            path = %path.display(),
            resource_types = dictionary.list_resource_types().len(),
            parameters = dictionary.len(),
            "Loaded search parameter dictionary"
        );
        Ok(dictionary)
    }

    /// Every entry must declare at least one path.
    fn from_file_entries(file: DictionaryFile) -> Result<Self, DictionaryError> {
        let dictionary = Self::new();
        for (resource_type, params) in file {
            for (name, entry) in params {
                if entry.paths.is_empty() {
                    return Err(DictionaryError::EmptyPaths {
                        resource_type,
                        name,
                    });
                }
                let param = SearchParamInfo {
                    name,
                    param_type: entry.param_type,
                    paths: entry.paths,
                };
                dictionary.register(resource_type.clone(), param);
            }
        }
        Ok(dictionary)
    }
}
