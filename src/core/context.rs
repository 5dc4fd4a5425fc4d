//! Pipeline context - the scoped variable map a pipeline reads and writes

use crate::core::value::{approximate_size, lookup_path};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Variables visible to a running pipeline scope
///
/// Each scope owns its context outright. Loop iterations, parallel branches
/// and try blocks work on a [`fork`](PipelineContext::fork) and only hand
/// values back to the parent explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineContext {
    variables: Map<String, Value>,
}

impl PipelineContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from an object value; any other value yields an empty context
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(variables) => Self { variables },
            _ => Self::new(),
        }
    }

    /// Set a variable
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Get a variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Remove a variable, returning its previous value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Look up `root` and walk `path` below it
    ///
    /// `None` means the root itself is undefined. A defined root with a path
    /// that cannot be followed yields `Some(Value::Null)`.
    pub fn lookup(&self, root: &str, path: &[String]) -> Option<Value> {
        let base = self.variables.get(root)?;
        Some(lookup_path(base, path).cloned().unwrap_or(Value::Null))
    }

    /// Copy this scope for a child that must not mutate it
    pub fn fork(&self) -> Self {
        self.clone()
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Estimated bytes held by all variables
    pub fn approximate_size(&self) -> u64 {
        self.variables
            .iter()
            .map(|(k, v)| k.len() as u64 + approximate_size(v))
            .sum()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.variables)
    }
}

impl From<Map<String, Value>> for PipelineContext {
    fn from(variables: Map<String, Value>) -> Self {
        Self { variables }
    }
}
