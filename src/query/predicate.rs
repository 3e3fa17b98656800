//! `where` predicate evaluation and the natural value order used for sorting.
//!
//! A predicate is a JSON object. Each key names a document field (dotted
//! paths reach nested values) and its value is either:
//!
//! - a scalar or array, compared by equality (numbers compare numerically),
//! - a nested object, matched field by field against a nested document value,
//! - an operator object such as `{"$gte": 2}` or `{"$in": ["a", "b"]}`.
//!
//! `$and` / `$or` combine whole sub-predicates. A field the predicate does not
//! mention is unconstrained; a field the document lacks compares as `null`.

use crate::error::ContentError;
use serde_json::{Map, Value};
use std::cmp::Ordering;

const OPERATORS: &[&str] = &[
    "$eq",
    "$ne",
    "$gt",
    "$gte",
    "$lt",
    "$lte",
    "$in",
    "$nin",
    "$contains",
    "$exists",
];

/// Check operator names and argument shapes before a query compiles.
pub fn validate(predicate: &Map<String, Value>) -> Result<(), ContentError> {
    for (key, expected) in predicate {
        match key.as_str() {
            "$and" | "$or" => {
                let branches = expected.as_array().ok_or_else(|| {
                    ContentError::invalid(format!("{key} expects an array of predicates"))
                })?;
                for branch in branches {
                    let branch = branch.as_object().ok_or_else(|| {
                        ContentError::invalid(format!("{key} branches must be objects"))
                    })?;
                    validate(branch)?;
                }
            }
            op if op.starts_with('$') => {
                return Err(ContentError::invalid(format!(
                    "operator {op} is not valid in field position"
                )));
            }
            field => validate_expected(field, expected)?,
        }
    }
    Ok(())
}

fn validate_expected(field: &str, expected: &Value) -> Result<(), ContentError> {
    let Value::Object(object) = expected else {
        return Ok(());
    };
    if !is_operator_object(object) {
        for (inner, value) in object {
            validate_expected(inner, value)?;
        }
        return Ok(());
    }
    for (op, argument) in object {
        match op.as_str() {
            "$in" | "$nin" if !argument.is_array() => {
                return Err(ContentError::invalid(format!(
                    "{op} on '{field}' expects an array"
                )));
            }
            "$exists" if !argument.is_boolean() => {
                return Err(ContentError::invalid(format!(
                    "$exists on '{field}' expects a boolean"
                )));
            }
            op if OPERATORS.contains(&op) => {}
            other => {
                return Err(ContentError::invalid(format!(
                    "unknown operator '{other}' on '{field}'"
                )));
            }
        }
    }
    Ok(())
}

fn is_operator_object(object: &Map<String, Value>) -> bool {
    object.keys().any(|k| k.starts_with('$'))
}

/// Resolve a field name against a document's field view.
///
/// An exact key wins; otherwise dots descend into nested objects.
pub fn lookup<'a>(fields: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = fields.get(path) {
        return Some(value);
    }
    let mut parts = path.split('.');
    let mut current = fields.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

pub fn matches(fields: &Map<String, Value>, predicate: &Map<String, Value>) -> bool {
    predicate.iter().all(|(key, expected)| match key.as_str() {
        "$and" => branches(expected).all(|branch| matches(fields, branch)),
        "$or" => branches(expected).any(|branch| matches(fields, branch)),
        field => match_value(lookup(fields, field), expected),
    })
}

/// AND `incoming` into `base`.
///
/// Field keys overwrite. `$and` lists are concatenated, and two `$or`
/// groups become separate branches of one `$and` so both must hold.
pub fn conjoin(base: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, expected) in incoming {
        match (key.as_str(), base.remove(&key)) {
            ("$and", Some(Value::Array(mut existing))) => {
                match expected {
                    Value::Array(more) => existing.extend(more),
                    other => existing.push(other),
                }
                base.insert(key, Value::Array(existing));
            }
            ("$or", Some(previous)) => {
                let mut both = Map::new();
                both.insert(
                    "$and".to_string(),
                    Value::Array(vec![
                        single("$or", previous),
                        single("$or", expected),
                    ]),
                );
                conjoin(base, both);
            }
            _ => {
                base.insert(key, expected);
            }
        }
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut object = Map::new();
    object.insert(key.to_string(), value);
    Value::Object(object)
}

fn branches(value: &Value) -> impl Iterator<Item = &Map<String, Value>> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn match_value(actual: Option<&Value>, expected: &Value) -> bool {
    match expected {
        Value::Object(object) if is_operator_object(object) => object
            .iter()
            .all(|(op, argument)| apply_operator(op, actual, argument)),
        Value::Object(object) => match actual {
            Some(Value::Object(inner)) => object
                .iter()
                .all(|(field, value)| match_value(inner.get(field), value)),
            _ => false,
        },
        _ => loose_eq(actual.unwrap_or(&Value::Null), expected),
    }
}

fn apply_operator(op: &str, actual: Option<&Value>, argument: &Value) -> bool {
    let value = actual.unwrap_or(&Value::Null);
    let ordered = |wanted: &[Ordering]| {
        same_kind(value, argument) && wanted.contains(&compare_values(Some(value), Some(argument)))
    };
    match op {
        "$eq" => loose_eq(value, argument),
        "$ne" => !loose_eq(value, argument),
        "$gt" => ordered(&[Ordering::Greater]),
        "$gte" => ordered(&[Ordering::Greater, Ordering::Equal]),
        "$lt" => ordered(&[Ordering::Less]),
        "$lte" => ordered(&[Ordering::Less, Ordering::Equal]),
        "$in" => in_list(value, argument),
        "$nin" => !in_list(value, argument),
        "$contains" => match value {
            Value::String(haystack) => argument.as_str().is_some_and(|n| haystack.contains(n)),
            Value::Array(items) => items.iter().any(|item| loose_eq(item, argument)),
            _ => false,
        },
        "$exists" => argument
            .as_bool()
            .is_some_and(|wanted| wanted == !value.is_null()),
        _ => false,
    }
}

fn in_list(value: &Value, list: &Value) -> bool {
    list.as_array()
        .is_some_and(|candidates| candidates.iter().any(|c| loose_eq(value, c)))
}

/// Equality where `1` and `1.0` are the same number.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| loose_eq(l, r))
        }
        _ => a == b,
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    !a.is_null() && kind_rank(a) == kind_rank(b)
}

/// Total order over JSON values: missing/null < bool < number < string <
/// array < object. Objects are mutually equal.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| compare_values(Some(l), Some(r)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}
