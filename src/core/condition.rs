//! Condition model and evaluator used by `conditional` steps and the `filter` transform

use crate::core::{
    context::PipelineContext,
    error::EngineError,
    value::{as_number, compare, is_empty},
    variables::resolve,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison operators understood by [`evaluate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    Empty,
    NotEmpty,
    Null,
    NotNull,
}

impl Operator {
    /// Parse an operator name or symbol
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "equals" | "eq" | "==" | "===" => Operator::Equals,
            "not_equals" | "neq" | "!=" | "!==" => Operator::NotEquals,
            ">" | "gt" | "greater_than" => Operator::GreaterThan,
            "<" | "lt" | "less_than" => Operator::LessThan,
            ">=" | "gte" | "greater_than_or_equal" | "greater_or_equal" => Operator::GreaterOrEqual,
            "<=" | "lte" | "less_than_or_equal" | "less_or_equal" => Operator::LessOrEqual,
            "contains" => Operator::Contains,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "empty" | "is_empty" => Operator::Empty,
            "not_empty" | "is_not_empty" => Operator::NotEmpty,
            "null" | "is_null" => Operator::Null,
            "not_null" | "is_not_null" => Operator::NotNull,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_known(name: &str) -> bool {
        Self::parse(name).is_some()
    }
}

fn default_operator() -> String {
    "not_empty".to_string()
}

/// A single `{field, operator, value}` predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Left-hand side; `$`-references are resolved against the context
    pub field: Value,

    #[serde(default = "default_operator")]
    pub operator: String,

    /// Right-hand side; `$`-references are resolved against the context
    #[serde(default)]
    pub value: Value,
}

/// Condition attached to a `conditional` step
///
/// Logical composition lives here at the step level; [`evaluate`] only
/// handles a single comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    All { and: Vec<Condition> },
    Any { or: Vec<Condition> },
    Not { not: Box<Condition> },
    Compare(Comparison),
    /// A bare list is an implicit `and`
    List(Vec<Condition>),
}

impl Condition {
    /// Evaluate against a context, resolving `$` references in fields and values
    pub fn evaluate(&self, context: &PipelineContext) -> Result<bool, EngineError> {
        match self {
            Condition::All { and } | Condition::List(and) => {
                for condition in and {
                    if !condition.evaluate(context)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any { or } => {
                for condition in or {
                    if condition.evaluate(context)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::Not { not } => Ok(!not.evaluate(context)?),
            Condition::Compare(comparison) => {
                let left = resolve(&comparison.field, context)?;
                let right = resolve(&comparison.value, context)?;
                evaluate(&left, &comparison.operator, &right)
            }
        }
    }
}

/// Evaluate one comparison between `value` and `compare_value`
///
/// Equality is strict: `1` does not equal `"1"`.
pub fn evaluate(value: &Value, operator: &str, compare_value: &Value) -> Result<bool, EngineError> {
    let op = Operator::parse(operator).ok_or_else(|| EngineError::UnknownOperator {
        operator: operator.to_string(),
    })?;

    let result = match op {
        Operator::Equals => value == compare_value,
        Operator::NotEquals => value != compare_value,
        Operator::GreaterThan => ordered(value, compare_value).is_some_and(Ordering::is_gt),
        Operator::LessThan => ordered(value, compare_value).is_some_and(Ordering::is_lt),
        Operator::GreaterOrEqual => ordered(value, compare_value).is_some_and(Ordering::is_ge),
        Operator::LessOrEqual => ordered(value, compare_value).is_some_and(Ordering::is_le),
        Operator::Contains => string_pair(value, compare_value).is_some_and(|(s, p)| s.contains(p)),
        Operator::StartsWith => {
            string_pair(value, compare_value).is_some_and(|(s, p)| s.starts_with(p))
        }
        Operator::EndsWith => string_pair(value, compare_value).is_some_and(|(s, p)| s.ends_with(p)),
        Operator::In => match compare_value {
            Value::Array(items) => items.contains(value),
            _ => false,
        },
        Operator::NotIn => match compare_value {
            Value::Array(items) => !items.contains(value),
            _ => false,
        },
        Operator::Empty => is_empty(value),
        Operator::NotEmpty => !is_empty(value),
        Operator::Null => value.is_null(),
        Operator::NotNull => !value.is_null(),
    };

    Ok(result)
}

/// Order two values for the numeric operators
///
/// Numbers (and numeric strings) compare numerically, two other strings
/// lexically; any other pairing is incomparable.
fn ordered(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Value::String(_), Value::String(_)) => Some(compare(a, b)),
        _ => None,
    }
}

fn string_pair<'a>(a: &'a Value, b: &'a Value) -> Option<(&'a str, &'a str)> {
    Some((a.as_str()?, b.as_str()?))
}
