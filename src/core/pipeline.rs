//! Pipeline domain model

use crate::core::{error::EngineError, limits::ExecutionLimits, step::Step};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A pipeline definition: an ordered tree of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Top-level steps
    pub steps: Vec<Step>,

    /// Context variable returned as the pipeline result; defaults to the last step's result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Suggested limits for runners that don't supply their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ExecutionLimits>,
}

impl Pipeline {
    /// Decode an already-validated definition
    pub fn from_value(definition: &Value) -> Result<Self, EngineError> {
        serde_json::from_value(definition.clone())
            .map_err(|e| EngineError::Definition(e.to_string()))
    }

    /// Total number of steps including nested ones
    pub fn total_steps(&self) -> usize {
        self.steps.iter().map(Step::total_steps).sum()
    }

    /// Deepest nesting level of any step list (top level is 0)
    pub fn max_nesting(&self) -> usize {
        fn depth_of(steps: &[Step], depth: usize) -> usize {
            steps
                .iter()
                .flat_map(|step| step.children())
                .map(|(_, children)| depth_of(children, depth + 1))
                .max()
                .unwrap_or(depth)
        }
        depth_of(&self.steps, 0)
    }
}

/// Read a pipeline definition (YAML or JSON) as a raw value tree
///
/// The raw tree is what the validator inspects; decode it with
/// [`Pipeline::from_value`] once it validates.
pub fn load_definition<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_definition(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse YAML or JSON text into a value tree
pub fn parse_definition(content: &str) -> Result<Value> {
    // YAML is a superset of JSON, so one parser covers both
    let value: Value = serde_yaml::from_str(content)?;
    Ok(value)
}
