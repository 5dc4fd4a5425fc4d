//! Variable resolution - substitutes `$name.path` references with context values

use crate::core::{context::PipelineContext, error::EngineError};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)((?:\.[A-Za-z0-9_\-]+)*)$").expect("valid reference pattern")
    })
}

/// A parsed `$root.seg.seg` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    pub root: String,
    pub path: Vec<String>,
}

impl VariableReference {
    /// Parse a whole string as a reference; text that merely contains one is not a reference
    pub fn parse(text: &str) -> Option<Self> {
        let captures = reference_pattern().captures(text)?;
        let root = captures.get(1)?.as_str().to_string();
        let path = captures
            .get(2)
            .map(|m| m.as_str())
            .unwrap_or("")
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Some(Self { root, path })
    }

    /// Resolve against a context
    ///
    /// An undefined root is an error; an unreachable path below a defined root is null.
    pub fn resolve(&self, context: &PipelineContext) -> Result<Value, EngineError> {
        context
            .lookup(&self.root, &self.path)
            .ok_or_else(|| EngineError::VariableNotFound {
                name: self.root.clone(),
            })
    }
}

/// Resolve every reference inside `value`, recursing into arrays and objects
///
/// Resolved values keep their original type; nothing is stringified.
pub fn resolve(value: &Value, context: &PipelineContext) -> Result<Value, EngineError> {
    match value {
        Value::String(text) => match VariableReference::parse(text) {
            Some(reference) => reference.resolve(context),
            None => Ok(value.clone()),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| resolve(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => resolve_map(map, context).map(Value::Object),
        other => Ok(other.clone()),
    }
}

/// Resolve each value of a map, keeping its keys
pub fn resolve_map(
    map: &Map<String, Value>,
    context: &PipelineContext,
) -> Result<Map<String, Value>, EngineError> {
    let mut resolved = Map::with_capacity(map.len());
    for (key, value) in map {
        resolved.insert(key.clone(), resolve(value, context)?);
    }
    Ok(resolved)
}
