//! Aggregations: reduce a collection to a single number

use crate::core::{
    error::EngineError,
    value::{as_number, compare, get_field, number_value},
};
use crate::transform::{expect_array, str_param};
use serde_json::{Map, Value};

/// Values to aggregate: the elements themselves, or their `field`
fn operands(transform: &str, data: Value, params: &Map<String, Value>) -> Result<Vec<Value>, EngineError> {
    let items = expect_array(transform, data)?;
    Ok(match str_param(params, "field") {
        Some(field) => items
            .iter()
            .map(|item| get_field(item, field).cloned().unwrap_or(Value::Null))
            .collect(),
        None => items,
    })
}

/// Number of elements of an array or object; anything else counts as 0
pub fn count(data: Value, _params: &Map<String, Value>) -> Result<Value, EngineError> {
    let n = match &data {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    };
    Ok(Value::from(n))
}

/// Exact integer view of a numeric operand, if it fits in an `i64`
fn integer_operand(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Sum of the numeric operands; non-numeric ones are skipped
///
/// Integer operands sum exactly; fractions, integers beyond `i64` and
/// overflowing totals fall back to floating point.
pub fn sum(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let values = operands("sum", data, params)?;
    let numeric: Vec<&Value> = values.iter().filter(|v| as_number(v).is_some()).collect();

    let exact = numeric
        .iter()
        .map(|v| integer_operand(v))
        .collect::<Option<Vec<i64>>>()
        .and_then(|ints| ints.into_iter().try_fold(0i64, i64::checked_add));
    if let Some(total) = exact {
        return Ok(Value::from(total));
    }

    Ok(number_value(numeric.iter().filter_map(|v| as_number(v)).sum()))
}

/// Arithmetic mean of the numeric operands; 0 when there are none
pub fn average(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let numbers: Vec<f64> = operands("average", data, params)?
        .iter()
        .filter_map(as_number)
        .collect();
    if numbers.is_empty() {
        return Ok(Value::from(0));
    }
    Ok(number_value(numbers.iter().sum::<f64>() / numbers.len() as f64))
}

/// Smallest non-null operand, or null for an empty input
pub fn min(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let values = operands("min", data, params)?;
    Ok(values
        .into_iter()
        .filter(|v| !v.is_null())
        .min_by(compare)
        .unwrap_or(Value::Null))
}

/// Largest non-null operand, or null for an empty input
pub fn max(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let values = operands("max", data, params)?;
    Ok(values
        .into_iter()
        .filter(|v| !v.is_null())
        .max_by(compare)
        .unwrap_or(Value::Null))
}
