use std::fmt;
use std::sync::Arc;

use time::UtcOffset;

use crate::compiler::compile;
use crate::config::{SearchConfig, UnknownParameterPolicy};
use crate::error::{ConfigError, QueryError, SearchError};
use crate::parameters::SearchParameterType;
use crate::parser::{BindError, bind};
use crate::predicate::PredicateTree;
use crate::registry::SearchParameterDictionary;

/// Why a parameter produced no predicate without being an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnknownParameter,
    UnsupportedType(SearchParameterType),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownParameter => f.write_str("unknown parameter"),
            SkipReason::UnsupportedType(ty) => write!(f, "unsupported type '{ty}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterOutcome {
    Compiled(PredicateTree),
    Skipped(SkipReason),
    Failed(SearchError),
}

/// The outcome of one `name=value` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledParameter {
    pub name: String,
    pub raw_value: String,
    pub outcome: ParameterOutcome,
}

impl CompiledParameter {
    pub fn predicate(&self) -> Option<&PredicateTree> {
        match &self.outcome {
            ParameterOutcome::Compiled(tree) => Some(tree),
            _ => None,
        }
    }
}

/// Every parameter of one query with its outcome, in query order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledQuery {
    pub parameters: Vec<CompiledParameter>,
}

impl CompiledQuery {
    /// AND of every compiled parameter; skipped and failed ones are left out.
    ///
    /// Returns `None` when nothing compiled.
    pub fn predicate(&self) -> Option<PredicateTree> {
        let trees: Vec<_> = self
            .parameters
            .iter()
            .filter_map(|p| p.predicate().cloned())
            .collect();
        if trees.is_empty() {
            None
        } else {
            Some(PredicateTree::all(trees))
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &CompiledParameter> {
        self.parameters
            .iter()
            .filter(|p| matches!(p.outcome, ParameterOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// All-or-nothing assembly: the first failed parameter fails the query.
    pub fn into_strict(self) -> Result<Option<PredicateTree>, QueryError> {
        let first_failure = self.parameters.iter().find_map(|p| match &p.outcome {
            ParameterOutcome::Failed(source) => Some(QueryError {
                name: p.name.clone(),
                value: p.raw_value.clone(),
                source: source.clone(),
            }),
            _ => None,
        });
        match first_failure {
            Some(err) => Err(err),
            None => Ok(self.predicate()),
        }
    }
}

/// Compiles query strings against an injected dictionary.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    dictionary: Arc<SearchParameterDictionary>,
    unknown_parameters: UnknownParameterPolicy,
    local_offset: UtcOffset,
}

impl QueryCompiler {
    pub fn new(
        dictionary: Arc<SearchParameterDictionary>,
        config: &SearchConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            dictionary,
            unknown_parameters: config.unknown_parameters,
            local_offset: config.local_offset()?,
        })
    }

    /// Build a compiler with the dictionary the config names.
    pub fn from_config(config: &SearchConfig) -> Result<Self, ConfigError> {
        Self::new(Arc::new(config.dictionary()?), config)
    }

    pub fn dictionary(&self) -> &SearchParameterDictionary {
        &self.dictionary
    }

    pub fn local_offset(&self) -> UtcOffset {
        self.local_offset
    }

    /// Compile every parameter of `query` for `resource_type`.
    ///
    /// A failure in one parameter never stops the others from compiling.
    pub fn compile_query(&self, resource_type: &str, query: &str) -> CompiledQuery {
        let parameters = bind(&self.dictionary, resource_type, query)
            .into_iter()
            .map(|binding| {
                let outcome = match binding.outcome {
                    Ok(bound) => match compile(&bound, self.local_offset) {
                        Ok(tree) => {
                            tracing::debug!(
                                resource_type,
                                name = %binding.name,
                                predicate = %tree,
                                "Compiled search parameter"
                            );
                            ParameterOutcome::Compiled(tree)
                        }
                        Err(e) => {
                            tracing::warn!(
                                resource_type,
                                name = %binding.name,
                                error = %e,
                                "Failed to compile search parameter"
                            );
                            ParameterOutcome::Failed(e.into())
                        }
                    },
                    Err(BindError::UnknownParameter(name)) => match self.unknown_parameters {
                        UnknownParameterPolicy::Ignore => {
                            ParameterOutcome::Skipped(SkipReason::UnknownParameter)
                        }
                        UnknownParameterPolicy::Reject => {
                            ParameterOutcome::Failed(SearchError::UnknownParameter(name))
                        }
                    },
                    Err(BindError::UnsupportedType(ty)) => {
                        ParameterOutcome::Skipped(SkipReason::UnsupportedType(ty))
                    }
                    Err(BindError::Parse(e)) => ParameterOutcome::Failed(e.into()),
                };
                CompiledParameter {
                    name: binding.name,
                    raw_value: binding.raw_value,
                    outcome,
                }
            })
            .collect();

        CompiledQuery { parameters }
    }
}
