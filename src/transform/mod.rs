//! Data transforms
//!
//! Pure operations over value trees, invoked by name from `transform` steps.
//! Transforms never see the pipeline context; parameters arrive already
//! resolved.

pub mod aggregate;
pub mod array;
pub mod registry;
pub mod string;

pub use registry::{TransformFn, TransformRegistry};

use crate::core::{error::EngineError, value::type_name};
use serde_json::{Map, Value};

pub(crate) fn invalid_input(transform: &str, message: impl Into<String>) -> EngineError {
    EngineError::InvalidTransformInput {
        transform: transform.to_string(),
        message: message.into(),
    }
}

/// Require an array input
pub(crate) fn expect_array(transform: &str, data: Value) -> Result<Vec<Value>, EngineError> {
    match data {
        Value::Array(items) => Ok(items),
        other => Err(invalid_input(
            transform,
            format!("expected an array, got {}", type_name(&other)),
        )),
    }
}

/// Require a string input
pub(crate) fn expect_string(transform: &str, data: Value) -> Result<String, EngineError> {
    match data {
        Value::String(s) => Ok(s),
        other => Err(invalid_input(
            transform,
            format!("expected a string, got {}", type_name(&other)),
        )),
    }
}

pub(crate) fn str_param<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

pub(crate) fn int_param(
    transform: &str,
    params: &Map<String, Value>,
    key: &str,
) -> Result<Option<i64>, EngineError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .map(Some)
            .ok_or_else(|| invalid_input(transform, format!("parameter '{}' must be an integer", key))),
    }
}
