//! FHIR search parameter parsing and predicate compilation.
//!
//! A query string is split into `name=value` pairs, each pair is looked up in
//! a [`SearchParameterDictionary`], its value is parsed by the typed parser
//! for the declared type, and the bound parameter is compiled into a
//! backend-neutral [`PredicateTree`].
//!
//! ```
//! use std::sync::Arc;
//! use octofhir_search_params::{QueryCompiler, SearchConfig, builtin_dictionary};
//!
//! let compiler = QueryCompiler::new(Arc::new(builtin_dictionary()), &SearchConfig::default()).unwrap();
//! let query = compiler.compile_query("Condition", "code=http://snomed.info/sct|123641001");
//! assert!(query.predicate().is_some());
//! ```

pub mod common;
pub mod compiler;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod escape;
pub mod parameters;
pub mod parser;
pub mod predicate;
pub mod registry;
pub mod types;

pub use common::builtin_dictionary;
pub use compiler::compile;
pub use config::{SearchConfig, UnknownParameterPolicy};
pub use document::to_document;
pub use engine::{CompiledParameter, CompiledQuery, ParameterOutcome, QueryCompiler, SkipReason};
pub use error::{CompileError, ConfigError, DictionaryError, ParseError, QueryError, SearchError};
pub use parameters::{PathShape, SearchParamInfo, SearchParameterType, SearchPrefix};
pub use parser::{BindError, Binding, BoundParameter, ParsedParam, ParsedParameters, bind, parse_query};
pub use predicate::{Comparison, FieldCondition, MatchOp, Operand, PathPredicate, PredicateTree};
pub use registry::SearchParameterDictionary;
pub use types::SearchValue;
