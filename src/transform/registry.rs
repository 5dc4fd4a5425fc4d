//! Transform registry - name-keyed dispatch table of transform functions

use crate::core::error::EngineError;
use crate::transform::{aggregate, array, string};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Signature every transform implements: input data plus resolved parameters
pub type TransformFn = fn(Value, &Map<String, Value>) -> Result<Value, EngineError>;

const BUILTINS: &[(&str, TransformFn)] = &[
    // Arrays
    ("filter", array::filter),
    ("map", array::map),
    ("pluck", array::pluck),
    ("unique", array::unique),
    ("sort", array::sort),
    ("reverse", array::reverse),
    ("slice", array::slice),
    ("chunk", array::chunk),
    ("flatten", array::flatten),
    ("merge", array::merge),
    ("first", array::first),
    ("last", array::last),
    ("keys", array::keys),
    ("values", array::values),
    ("group_by", array::group_by),
    // Aggregations
    ("count", aggregate::count),
    ("sum", aggregate::sum),
    ("average", aggregate::average),
    ("min", aggregate::min),
    ("max", aggregate::max),
    // Strings
    ("join", string::join),
    ("split", string::split),
    ("trim", string::trim),
    ("uppercase", string::uppercase),
    ("lowercase", string::lowercase),
];

/// Catalog of named transforms, built once and shared by an engine
#[derive(Clone)]
pub struct TransformRegistry {
    transforms: HashMap<String, TransformFn>,
}

impl TransformRegistry {
    /// Create a registry with no transforms
    pub fn empty() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in catalog
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (name, func) in BUILTINS {
            registry.register(*name, *func);
        }
        registry
    }

    /// Register (or replace) a transform
    pub fn register(&mut self, name: impl Into<String>, func: TransformFn) {
        self.transforms.insert(name.into(), func);
    }

    pub fn has(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Run transform `name` over `data`
    pub fn execute(
        &self,
        name: &str,
        data: Value,
        params: &Map<String, Value>,
    ) -> Result<Value, EngineError> {
        let func = self
            .transforms
            .get(name)
            .ok_or_else(|| EngineError::UnknownTransform {
                name: name.to_string(),
            })?;
        debug!("Applying transform {}", name);
        func(data, params)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("transforms", &self.names())
            .finish()
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}
