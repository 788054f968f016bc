//! Render predicate trees as MongoDB-style filter documents.
//!
//! Case-insensitive matches become anchored `$regex` filters with the `i`
//! option, comparisons become `$gt`/`$gte`/`$lt`/`$lte` on extended JSON
//! values (`$numberDecimal`, `$date`), and array element matches become
//! `$elemMatch`.

use serde_json::{Map, Value, json};
use time::format_description::well_known::Rfc3339;

use crate::predicate::{Comparison, FieldCondition, MatchOp, Operand, PredicateTree};
use crate::types::to_decimal_string;

/// Render a predicate tree as a filter document.
pub fn to_document(tree: &PredicateTree) -> Value {
    match tree {
        PredicateTree::Leaf(leaf) => conditions_document(&leaf.conditions),
        PredicateTree::Or(children) => {
            json!({ "$or": children.iter().map(to_document).collect::<Vec<_>>() })
        }
        PredicateTree::And(children) => {
            json!({ "$and": children.iter().map(to_document).collect::<Vec<_>>() })
        }
    }
}

/// One document for a conjunction of field conditions.
///
/// Comparisons on the same field share one operator object. Any other
/// repeated field is moved into an `$and`.
fn conditions_document(conditions: &[FieldCondition]) -> Value {
    let mut doc = Map::new();
    let mut extra = Vec::new();

    for condition in conditions {
        let value = op_value(&condition.op);
        match doc.get_mut(&condition.field) {
            None => {
                doc.insert(condition.field.clone(), value);
            }
            Some(existing) => {
                if let Some(merged) = merge_comparisons(existing, &value) {
                    *existing = merged;
                } else {
                    let mut single = Map::new();
                    single.insert(condition.field.clone(), value);
                    extra.push(Value::Object(single));
                }
            }
        }
    }

    if extra.is_empty() {
        return Value::Object(doc);
    }
    let mut all = vec![Value::Object(doc)];
    all.extend(extra);
    json!({ "$and": all })
}

fn op_value(op: &MatchOp) -> Value {
    match op {
        MatchOp::Equals(value) => Value::String(value.clone()),
        MatchOp::EqualsIgnoreCase(value) => case_insensitive_regex(format!(
            "^{}$",
            regex::escape(value)
        )),
        MatchOp::StartsWithIgnoreCase(value) => {
            case_insensitive_regex(format!("^{}", regex::escape(value)))
        }
        MatchOp::ElementMatch(conditions) => {
            json!({ "$elemMatch": conditions_document(conditions) })
        }
        MatchOp::Compare(cmp, operand) => {
            let mut object = Map::new();
            object.insert(comparison_operator(*cmp).to_string(), operand_value(operand));
            Value::Object(object)
        }
    }
}

fn case_insensitive_regex(pattern: String) -> Value {
    json!({ "$regex": pattern, "$options": "i" })
}

fn comparison_operator(cmp: Comparison) -> &'static str {
    match cmp {
        Comparison::Lt => "$lt",
        Comparison::Le => "$lte",
        Comparison::Gt => "$gt",
        Comparison::Ge => "$gte",
    }
}

fn operand_value(operand: &Operand) -> Value {
    match operand {
        Operand::Decimal(value) => json!({ "$numberDecimal": to_decimal_string(value) }),
        Operand::Instant(instant) => {
            let text = instant
                .format(&Rfc3339)
                .unwrap_or_else(|_| instant.to_string());
            json!({ "$date": text })
        }
    }
}

fn is_comparison_object(value: &Value) -> bool {
    value.as_object().is_some_and(|object| {
        object
            .keys()
            .all(|k| matches!(k.as_str(), "$lt" | "$lte" | "$gt" | "$gte"))
    })
}

/// Merge two comparison objects with disjoint operators.
fn merge_comparisons(existing: &Value, new: &Value) -> Option<Value> {
    if !is_comparison_object(existing) || !is_comparison_object(new) {
        return None;
    }
    let mut merged = existing.as_object()?.clone();
    for (operator, operand) in new.as_object()? {
        if merged.contains_key(operator) {
            return None;
        }
        merged.insert(operator.clone(), operand.clone());
    }
    Some(Value::Object(merged))
}
