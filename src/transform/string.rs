//! String transforms

use crate::core::{error::EngineError, value::to_display_string};
use crate::transform::{expect_array, expect_string, int_param, invalid_input, str_param};
use serde_json::{Map, Value};

/// Join array elements with `separator` (default ", ")
pub fn join(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let items = expect_array("join", data)?;
    let separator = str_param(params, "separator").unwrap_or(", ");
    let parts: Vec<String> = items.iter().map(to_display_string).collect();
    Ok(Value::String(parts.join(separator)))
}

/// Split a string on `separator` (default ","), optionally capped by `limit`
pub fn split(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let text = expect_string("split", data)?;
    let separator = str_param(params, "separator").unwrap_or(",");
    if separator.is_empty() {
        return Err(invalid_input("split", "separator must not be empty"));
    }

    let parts: Vec<Value> = match int_param("split", params, "limit")? {
        Some(limit) if limit > 0 => text
            .splitn(limit as usize, separator)
            .map(|s| Value::String(s.to_string()))
            .collect(),
        _ => text
            .split(separator)
            .map(|s| Value::String(s.to_string()))
            .collect(),
    };
    Ok(Value::Array(parts))
}

/// Strip whitespace, or any of `characters`, from both ends
pub fn trim(data: Value, params: &Map<String, Value>) -> Result<Value, EngineError> {
    let text = expect_string("trim", data)?;
    let trimmed = match str_param(params, "characters") {
        Some(chars) => {
            let set: Vec<char> = chars.chars().collect();
            text.trim_matches(set.as_slice()).to_string()
        }
        None => text.trim().to_string(),
    };
    Ok(Value::String(trimmed))
}

pub fn uppercase(data: Value, _params: &Map<String, Value>) -> Result<Value, EngineError> {
    Ok(Value::String(expect_string("uppercase", data)?.to_uppercase()))
}

pub fn lowercase(data: Value, _params: &Map<String, Value>) -> Result<Value, EngineError> {
    Ok(Value::String(expect_string("lowercase", data)?.to_lowercase()))
}
