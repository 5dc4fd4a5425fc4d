//! Array transforms

use crate::core::{
    condition::evaluate,
    error::EngineError,
    value::{compare, get_field, is_truthy, to_display_string, type_name},
};
use crate::transform::{expect_array, int_param, invalid_input, str_param};
use serde_json::{Map, Value};

fn field_or_null(item: &Value, field: &str) -> Value {
    get_field(item, field).cloned().unwrap_or(Value::Null)
}

fn required_field<'a>(transform: &str, params: &'a Map<String, Value>) -> Result<&'a str, EngineError> {
    str_param(params, "field").ok_or_else(|| invalid_input(transform, "missing 'field' parameter"))
}

/// Keep elements matching `{field, operator, value}`; without an operator keep truthy ones
pub fn filter(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let items = expect_array("filter", data)?;
    let field = str_param(params, "field");
    let operator = str_param(params, "operator");
    let compare_value = params.get("value").cloned().unwrap_or(Value::Null);

    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        let subject = match field {
            Some(field) => field_or_null(&item, field),
            None => item.clone(),
        };
        let keep = match operator {
            Some(operator) => evaluate(&subject, operator, &compare_value)?,
            None => is_truthy(&subject),
        };
        if keep {
            kept.push(item);
        }
    }
    Ok(Value::Array(kept))
}

/// Extract `field` from every element (null where absent), or project `fields` into objects
pub fn map(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let items = expect_array("map", data)?;

    if let Some(Value::Array(fields)) = params.get("fields") {
        let names: Vec<&str> = fields.iter().filter_map(Value::as_str).collect();
        let projected = items
            .iter()
            .map(|item| {
                let object: Map<String, Value> = names
                    .iter()
                    .map(|name| (name.to_string(), field_or_null(item, name)))
                    .collect();
                Value::Object(object)
            })
            .collect();
        return Ok(Value::Array(projected));
    }

    let field = required_field("map", params)?;
    Ok(Value::Array(
        items.iter().map(|item| field_or_null(item, field)).collect(),
    ))
}

/// Column extraction: like `map`, but elements without the field are dropped
pub fn pluck(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let items = expect_array("pluck", data)?;
    let field = required_field("pluck", params)?;
    Ok(Value::Array(
        items
            .iter()
            .filter_map(|item| get_field(item, field).cloned())
            .collect(),
    ))
}

/// Remove duplicates by value (or by `field`), keeping first occurrences in order
pub fn unique(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let items = expect_array("unique", data)?;
    let field = str_param(params, "field");

    let mut seen: Vec<Value> = Vec::new();
    let mut result = Vec::new();
    for item in items {
        let key = match field {
            Some(field) => field_or_null(&item, field),
            None => item.clone(),
        };
        if !seen.contains(&key) {
            seen.push(key);
            result.push(item);
        }
    }
    Ok(Value::Array(result))
}

/// Stable sort by value or `field`, `order` = `asc` (default) or `desc`
pub fn sort(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let mut items = expect_array("sort", data)?;
    let field = str_param(params, "field");
    let descending = match str_param(params, "order").or_else(|| str_param(params, "direction")) {
        None => false,
        Some(order) if order.eq_ignore_ascii_case("asc") => false,
        Some(order) if order.eq_ignore_ascii_case("desc") => true,
        Some(order) => {
            return Err(invalid_input("sort", format!("unknown sort order '{}'", order)));
        }
    };

    items.sort_by(|a, b| {
        let (left, right) = match field {
            Some(field) => (field_or_null(a, field), field_or_null(b, field)),
            None => (a.clone(), b.clone()),
        };
        if descending {
            compare(&right, &left)
        } else {
            compare(&left, &right)
        }
    });
    Ok(Value::Array(items))
}

pub fn reverse(data: Value, _params: &Map<String, Value>) -> Result<Value, EngineError> {
    let mut items = expect_array("reverse", data)?;
    items.reverse();
    Ok(Value::Array(items))
}

/// `offset` (negative counts from the end) and optional `length`, clamped to bounds
pub fn slice(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let items = expect_array("slice", data)?;
    let len = items.len() as i64;
    let offset = int_param("slice", params, "offset")?.unwrap_or(0);

    let start = if offset < 0 {
        (len + offset).max(0)
    } else {
        offset.min(len)
    };
    let end = match int_param("slice", params, "length")? {
        None => len,
        Some(length) if length < 0 => (len + length).max(start),
        Some(length) => start.saturating_add(length).min(len),
    };

    Ok(Value::Array(items[start as usize..end as usize].to_vec()))
}

/// Split into batches of `size` (default 10); the last batch may be shorter
pub fn chunk(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let items = expect_array("chunk", data)?;
    let size = int_param("chunk", params, "size")?.unwrap_or(10);
    if size < 1 {
        return Err(invalid_input("chunk", "parameter 'size' must be at least 1"));
    }
    Ok(Value::Array(
        items
            .chunks(size as usize)
            .map(|batch| Value::Array(batch.to_vec()))
            .collect(),
    ))
}

/// Flatten nested arrays, up to `depth` levels when given
pub fn flatten(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let items = expect_array("flatten", data)?;
    let depth = match int_param("flatten", params, "depth")? {
        Some(depth) if depth < 0 => {
            return Err(invalid_input("flatten", "parameter 'depth' must not be negative"));
        }
        Some(depth) => Some(depth as usize),
        None => None,
    };

    let mut flat = Vec::new();
    flatten_into(items, depth, &mut flat);
    Ok(Value::Array(flat))
}

fn flatten_into(items: Vec<Value>, depth: Option<usize>, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(inner) if depth != Some(0) => {
                flatten_into(inner, depth.map(|d| d - 1), out);
            }
            other => out.push(other),
        }
    }
}

/// Append the `with` array; two objects merge shallowly with `with` winning
pub fn merge(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let with = params
        .get("with")
        .cloned()
        .ok_or_else(|| invalid_input("merge", "missing 'with' parameter"))?;

    match (data, with) {
        (Value::Array(mut items), Value::Array(extra)) => {
            items.extend(extra);
            Ok(Value::Array(items))
        }
        (Value::Object(mut object), Value::Object(extra)) => {
            object.extend(extra);
            Ok(Value::Object(object))
        }
        (data, with) => Err(invalid_input(
            "merge",
            format!("cannot merge {} with {}", type_name(&data), type_name(&with)),
        )),
    }
}

pub fn first(data: Value, _params: &Map<String, Value>) -> Result<Value, EngineError> {
    let items = expect_array("first", data)?;
    Ok(items.into_iter().next().unwrap_or(Value::Null))
}

pub fn last(data: Value, _params: &Map<String, Value>) -> Result<Value, EngineError> {
    let items = expect_array("last", data)?;
    Ok(items.into_iter().last().unwrap_or(Value::Null))
}

/// Object keys, or array indices
pub fn keys(data: Value, _params: &Map<String, Value>) -> Result<Value, EngineError> {
    match data {
        Value::Object(object) => Ok(Value::Array(object.into_iter().map(|(k, _)| Value::String(k)).collect())),
        Value::Array(items) => Ok(Value::Array((0..items.len()).map(Value::from).collect())),
        other => Err(invalid_input(
            "keys",
            format!("expected an object or array, got {}", type_name(&other)),
        )),
    }
}

/// Object values, or the array itself
pub fn values(data: Value, _params: &Map<String, Value>) -> Result<Value, EngineError> {
    match data {
        Value::Object(object) => Ok(Value::Array(object.into_iter().map(|(_, v)| v).collect())),
        Value::Array(items) => Ok(Value::Array(items)),
        other => Err(invalid_input(
            "values",
            format!("expected an object or array, got {}", type_name(&other)),
        )),
    }
}

/// Group elements into an object keyed by the string form of `field`
pub fn group_by(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let items = expect_array("group_by", data)?;
    let field = required_field("group_by", params)?;

    let mut groups = Map::new();
    for item in items {
        let key = to_display_string(&field_or_null(&item, field));
        if let Value::Array(group) = groups.entry(key).or_insert_with(|| Value::Array(Vec::new())) {
            group.push(item);
        }
    }
    Ok(Value::Object(groups))
}
