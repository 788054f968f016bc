//! Backend-neutral predicate tree.
//!
//! The compiler produces one tree per bound parameter: a leaf when the
//! parameter has a single path, an `Or` across paths otherwise. Query
//! assembly ANDs the trees of different parameters. Storage backends
//! translate the tree into their own filter language (see [`crate::document`]).

use std::fmt;

use num_rational::BigRational;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::types::to_decimal_string;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateTree {
    Leaf(PathPredicate),
    Or(Vec<PredicateTree>),
    And(Vec<PredicateTree>),
}

impl PredicateTree {
    /// OR the trees together, collapsing a single tree to itself.
    pub fn any(mut trees: Vec<PredicateTree>) -> PredicateTree {
        if trees.len() == 1 {
            trees.remove(0)
        } else {
            PredicateTree::Or(trees)
        }
    }

    /// AND the trees together, collapsing a single tree to itself.
    pub fn all(mut trees: Vec<PredicateTree>) -> PredicateTree {
        if trees.len() == 1 {
            trees.remove(0)
        } else {
            PredicateTree::And(trees)
        }
    }

    /// Every leaf of the tree, depth first.
    pub fn leaves(&self) -> Vec<&PathPredicate> {
        match self {
            PredicateTree::Leaf(leaf) => vec![leaf],
            PredicateTree::Or(children) | PredicateTree::And(children) => {
                children.iter().flat_map(PredicateTree::leaves).collect()
            }
        }
    }
}

impl From<PathPredicate> for PredicateTree {
    fn from(leaf: PathPredicate) -> Self {
        PredicateTree::Leaf(leaf)
    }
}

/// Conditions on fields under one search path; all must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPredicate {
    pub path: String,
    pub conditions: Vec<FieldCondition>,
}

impl PathPredicate {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            conditions: Vec::new(),
        }
    }

    /// Add a condition on `path.suffix` (or on `path` itself when `suffix` is empty).
    #[must_use]
    pub fn with(mut self, suffix: &str, op: MatchOp) -> Self {
        let field = if suffix.is_empty() {
            self.path.clone()
        } else {
            format!("{}.{}", self.path, suffix)
        };
        self.conditions.push(FieldCondition { field, op });
        self
    }
}

/// A match on a single field.
///
/// Inside [`MatchOp::ElementMatch`] the field name is relative to the array
/// element; everywhere else it is the full dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCondition {
    pub field: String,
    pub op: MatchOp,
}

impl FieldCondition {
    pub fn new(field: impl Into<String>, op: MatchOp) -> Self {
        Self {
            field: field.into(),
            op,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOp {
    /// Case-sensitive exact match
    Equals(String),
    /// Case-insensitive exact match
    EqualsIgnoreCase(String),
    /// Case-insensitive prefix match
    StartsWithIgnoreCase(String),
    /// Some element of the array field satisfies every condition
    ElementMatch(Vec<FieldCondition>),
    Compare(Comparison, Operand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Decimal(BigRational),
    Instant(OffsetDateTime),
}

impl From<BigRational> for Operand {
    fn from(value: BigRational) -> Self {
        Operand::Decimal(value)
    }
}

impl From<OffsetDateTime> for Operand {
    fn from(value: OffsetDateTime) -> Self {
        Operand::Instant(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Decimal(value) => f.write_str(&to_decimal_string(value)),
            Operand::Instant(instant) => match instant.format(&Rfc3339) {
                Ok(text) => f.write_str(&text),
                Err(_) => write!(f, "{instant}"),
            },
        }
    }
}

impl fmt::Display for MatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOp::Equals(v) => write!(f, "= {v:?}"),
            MatchOp::EqualsIgnoreCase(v) => write!(f, "=~ {v:?}"),
            MatchOp::StartsWithIgnoreCase(v) => write!(f, "starts-with~ {v:?}"),
            MatchOp::ElementMatch(conditions) => {
                f.write_str("has element {")?;
                for (i, c) in conditions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("}")
            }
            MatchOp::Compare(cmp, operand) => write!(f, "{} {operand}", cmp.symbol()),
        }
    }
}

impl fmt::Display for FieldCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.op)
    }
}

impl fmt::Display for PathPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PredicateTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (children, joiner) = match self {
            PredicateTree::Leaf(leaf) => return write!(f, "{leaf}"),
            PredicateTree::Or(children) => (children, " OR "),
            PredicateTree::And(children) => (children, " AND "),
        };
        f.write_str("(")?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(joiner)?;
            }
            write!(f, "{child}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_builds_dotted_fields() {
        let leaf = PathPredicate::new("patient")
            .with("referenceid", MatchOp::EqualsIgnoreCase("1".into()))
            .with("", MatchOp::Equals("x".into()));
        assert_eq!(leaf.conditions[0].field, "patient.referenceid");
        assert_eq!(leaf.conditions[1].field, "patient");
    }

    #[test]
    fn test_any_collapses_single_tree() {
        let leaf: PredicateTree = PathPredicate::new("a").into();
        assert_eq!(PredicateTree::any(vec![leaf.clone()]), leaf);
        assert!(matches!(
            PredicateTree::any(vec![leaf.clone(), leaf.clone()]),
            PredicateTree::Or(_)
        ));
        assert!(matches!(PredicateTree::all(vec![leaf.clone(), leaf]), PredicateTree::And(_)));
    }

    #[test]
    fn test_display() {
        let tree = PredicateTree::Or(vec![
            PathPredicate::new("name.family")
                .with("", MatchOp::StartsWithIgnoreCase("eve".into()))
                .into(),
            PathPredicate::new("name.given")
                .with("", MatchOp::StartsWithIgnoreCase("eve".into()))
                .into(),
        ]);
        assert_eq!(
            tree.to_string(),
            r#"(name.family starts-with~ "eve" OR name.given starts-with~ "eve")"#
        );
        assert_eq!(tree.leaves().len(), 2);
    }
}
