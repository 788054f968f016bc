//! Compile bound parameters into predicate trees.
//!
//! Each path of the parameter becomes one subtree, chosen by the declared
//! type and the shape stored at that path:
//! - reference: `referenceid` (+ `type`) or `reference` for absolute URLs
//! - string: case-insensitive prefix, exact for `_id`
//! - token: sub-fields by shape (Coding, CodeableConcept, Identifier, ContactPoint, scalar)
//! - uri: exact, case-sensitive
//! - number / date: range comparisons according to the prefix
//! - quantity: number rule on `value`, plus `system` and `code`
//!
//! Several paths are ORed in declaration order.

use time::{Duration, UtcOffset};

use crate::error::CompileError;
use crate::parameters::{PathShape, SearchParameterType, SearchPrefix};
use crate::parser::BoundParameter;
use crate::predicate::{Comparison, FieldCondition, MatchOp, Operand, PathPredicate, PredicateTree};
use crate::types::{
    DateValue, NumberValue, QuantityValue, ReferenceValue, SearchValue, StringValue, TokenValue,
    UriValue,
};

/// Compile one bound parameter.
///
/// `local` is the offset applied to dates written without a zone.
pub fn compile(param: &BoundParameter, local: UtcOffset) -> Result<PredicateTree, CompileError> {
    if param.paths.is_empty() {
        return Err(CompileError::NoPaths(param.name.clone()));
    }
    let trees = param
        .paths
        .iter()
        .map(|(path, shape)| compile_path(param, path, shape, local))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PredicateTree::any(trees))
}

fn compile_path(
    param: &BoundParameter,
    path: &str,
    shape: &PathShape,
    local: UtcOffset,
) -> Result<PredicateTree, CompileError> {
    let unsupported = || CompileError::UnsupportedShape {
        param_type: param.param_type,
        path: path.to_string(),
        shape: shape.clone(),
    };

    match (&param.value, shape) {
        (SearchValue::Reference(value), _) => Ok(reference_predicate(path, value).into()),
        (SearchValue::String(value), _) => Ok(string_predicate(&param.name, path, value).into()),
        (SearchValue::Token(value), shape) => token_predicate(path, shape, value)
            .map(PredicateTree::from)
            .ok_or_else(unsupported),
        (SearchValue::Uri(value), PathShape::Scalar(_)) => Ok(uri_predicate(path, value).into()),
        (SearchValue::Number(value), PathShape::Scalar(_)) => {
            Ok(number_predicate(path, "", value.prefix, value))
        }
        (SearchValue::Date(value), PathShape::Scalar(_)) => {
            Ok(date_predicate(path, value, local))
        }
        (SearchValue::Quantity(value), PathShape::Quantity) => Ok(quantity_predicate(path, value)),
        _ => Err(unsupported()),
    }
}

fn reference_predicate(path: &str, value: &ReferenceValue) -> PathPredicate {
    let leaf = PathPredicate::new(path);
    if let Some(url) = value.url() {
        return leaf.with("reference", MatchOp::EqualsIgnoreCase(url.to_string()));
    }

    let mut leaf = leaf;
    if let Some(id) = value.id() {
        leaf = leaf.with("referenceid", MatchOp::EqualsIgnoreCase(id.to_string()));
    }
    if let Some(resource_type) = value.resource_type() {
        leaf = leaf.with("type", MatchOp::Equals(resource_type.to_string()));
    }
    leaf
}

fn string_predicate(name: &str, path: &str, value: &StringValue) -> PathPredicate {
    let op = if name == "_id" {
        MatchOp::EqualsIgnoreCase(value.value.clone())
    } else {
        MatchOp::StartsWithIgnoreCase(value.value.clone())
    };
    PathPredicate::new(path).with("", op)
}

fn uri_predicate(path: &str, value: &UriValue) -> PathPredicate {
    PathPredicate::new(path).with("", MatchOp::Equals(value.uri.clone()))
}

fn token_predicate(path: &str, shape: &PathShape, value: &TokenValue) -> Option<PathPredicate> {
    let code = || MatchOp::EqualsIgnoreCase(value.code.clone());
    let leaf = PathPredicate::new(path);

    // Field holding the system part for each shape
    let (code_field, system_field) = match shape {
        PathShape::Coding => ("code", "system"),
        PathShape::Identifier => ("value", "system"),
        PathShape::ContactPoint => ("value", "use"),
        PathShape::CodeableConcept => {
            return Some(match value.system() {
                None => leaf.with("coding.code", code()),
                Some(system) => leaf.with(
                    "coding",
                    MatchOp::ElementMatch(vec![
                        FieldCondition::new("system", MatchOp::EqualsIgnoreCase(system.to_string())),
                        FieldCondition::new("code", code()),
                    ]),
                ),
            });
        }
        PathShape::Scalar(_) => return Some(leaf.with("", code())),
        PathShape::Reference | PathShape::Quantity => return None,
    };

    let leaf = leaf.with(code_field, code());
    Some(match value.system() {
        Some(system) => leaf.with(system_field, MatchOp::EqualsIgnoreCase(system.to_string())),
        None => leaf,
    })
}

fn compare<T>(path: &str, suffix: &str, cmp: Comparison, operand: T) -> PathPredicate
where
    Operand: From<T>,
{
    PathPredicate::new(path).with(suffix, MatchOp::Compare(cmp, Operand::from(operand)))
}

/// `low <= field < high`
fn within<T>(path: &str, suffix: &str, low: T, high: T) -> PathPredicate
where
    Operand: From<T>,
{
    compare(path, suffix, Comparison::Ge, low).with(
        suffix,
        MatchOp::Compare(Comparison::Lt, Operand::from(high)),
    )
}

/// `field < low OR field >= high`
fn outside<T>(path: &str, suffix: &str, low: T, high: T) -> PredicateTree
where
    Operand: From<T>,
{
    PredicateTree::Or(vec![
        compare(path, suffix, Comparison::Lt, low).into(),
        compare(path, suffix, Comparison::Ge, high).into(),
    ])
}

fn number_predicate(
    path: &str,
    suffix: &str,
    prefix: SearchPrefix,
    value: &NumberValue,
) -> PredicateTree {
    let exact = || value.value.clone();
    match prefix {
        SearchPrefix::Eq => {
            within(path, suffix, value.range_low_incl(), value.range_high_excl()).into()
        }
        SearchPrefix::Ne => outside(path, suffix, value.range_low_incl(), value.range_high_excl()),
        SearchPrefix::Gt => compare(path, suffix, Comparison::Gt, exact()).into(),
        SearchPrefix::Lt => compare(path, suffix, Comparison::Lt, exact()).into(),
        SearchPrefix::Ge => compare(path, suffix, Comparison::Ge, exact()).into(),
        SearchPrefix::Le => compare(path, suffix, Comparison::Le, exact()).into(),
        SearchPrefix::Ap => {
            let (low, high) = value.approximate_range();
            compare(path, suffix, Comparison::Ge, low)
                .with(suffix, MatchOp::Compare(Comparison::Le, Operand::Decimal(high)))
                .into()
        }
    }
}

fn date_predicate(path: &str, value: &DateValue, local: UtcOffset) -> PredicateTree {
    let range = value.to_range(local);
    let (start, end) = (range.start, range.end);
    match value.prefix {
        SearchPrefix::Eq => within(path, "", start, end).into(),
        SearchPrefix::Ne => outside(path, "", start, end),
        SearchPrefix::Gt => compare(path, "", Comparison::Ge, end).into(),
        SearchPrefix::Lt => compare(path, "", Comparison::Lt, start).into(),
        SearchPrefix::Ge => compare(path, "", Comparison::Ge, start).into(),
        SearchPrefix::Le => compare(path, "", Comparison::Lt, end).into(),
        SearchPrefix::Ap => {
            let margin = approximate_margin(range.duration());
            let low = start.checked_sub(margin).unwrap_or(start);
            let high = end.checked_add(margin).unwrap_or(end);
            within(path, "", low, high).into()
        }
    }
}

/// A tenth of the range width, at whole-millisecond granularity.
fn approximate_margin(width: Duration) -> Duration {
    Duration::milliseconds((width.whole_milliseconds() / 10) as i64)
}

fn quantity_predicate(path: &str, value: &QuantityValue) -> PredicateTree {
    let mut parts = vec![number_predicate(path, "value", value.prefix, &value.number)];

    let mut units = PathPredicate::new(path);
    if let Some(system) = value.system() {
        units = units.with("system", MatchOp::Equals(system.to_string()));
    }
    if let Some(code) = value.code() {
        units = units.with("code", MatchOp::Equals(code.to_string()));
    }
    if !units.conditions.is_empty() {
        parts.push(units.into());
    }

    PredicateTree::all(parts)
}

/// Whether the compiler has a rule for this type on this shape.
pub fn supports(param_type: SearchParameterType, shape: &PathShape) -> bool {
    match param_type {
        SearchParameterType::Reference | SearchParameterType::String => true,
        SearchParameterType::Token => {
            !matches!(shape, PathShape::Reference | PathShape::Quantity)
        }
        SearchParameterType::Uri | SearchParameterType::Number | SearchParameterType::Date => {
            shape.is_scalar()
        }
        SearchParameterType::Quantity => *shape == PathShape::Quantity,
        SearchParameterType::Composite | SearchParameterType::Special => false,
    }
}
