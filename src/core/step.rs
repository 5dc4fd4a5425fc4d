//! Step domain model

use crate::core::{condition::Condition, pipeline::Pipeline};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Kinds of step a pipeline can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Ability,
    Transform,
    Conditional,
    Loop,
    Parallel,
    TryCatch,
    SubPipeline,
}

impl StepKind {
    pub const ALL: [StepKind; 7] = [
        StepKind::Ability,
        StepKind::Transform,
        StepKind::Conditional,
        StepKind::Loop,
        StepKind::Parallel,
        StepKind::TryCatch,
        StepKind::SubPipeline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Ability => "ability",
            StepKind::Transform => "transform",
            StepKind::Conditional => "conditional",
            StepKind::Loop => "loop",
            StepKind::Parallel => "parallel",
            StepKind::TryCatch => "try_catch",
            StepKind::SubPipeline => "sub_pipeline",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_item_var() -> String {
    "item".to_string()
}

/// Treat an explicit `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn item_var_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_item_var))
}

/// A single step in a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Invoke a named ability with resolved input
    Ability {
        ability: String,
        #[serde(default)]
        input: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },

    /// Apply a registered data transform
    Transform {
        operation: String,
        input: Value,
        #[serde(default, deserialize_with = "null_as_default")]
        params: Map<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },

    /// Run `then` or `else` in the current scope
    Conditional {
        condition: Condition,
        #[serde(default, deserialize_with = "null_as_default")]
        then: Vec<Step>,
        #[serde(default, rename = "else", deserialize_with = "null_as_default")]
        otherwise: Vec<Step>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },

    /// Run `steps` once per element of `input`, each iteration in a forked scope
    Loop {
        input: Value,
        steps: Vec<Step>,
        #[serde(
            default = "default_item_var",
            rename = "item_var",
            alias = "itemVar",
            deserialize_with = "item_var_or_default"
        )]
        item_var: String,
        #[serde(default, rename = "index_var", alias = "indexVar", skip_serializing_if = "Option::is_none")]
        index_var: Option<String>,
        /// Iteration-scope variable to collect instead of the last step result
        #[serde(default, skip_serializing_if = "Option::is_none")]
        collect: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },

    /// Run each step as an independent branch on a forked scope
    Parallel {
        #[serde(deserialize_with = "null_as_default")]
        steps: Vec<Step>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },

    /// Recover from failures in `try` with `catch`, then always run `finally`
    TryCatch {
        #[serde(rename = "try")]
        attempt: Vec<Step>,
        #[serde(default, rename = "catch", skip_serializing_if = "Option::is_none")]
        recover: Option<Vec<Step>>,
        #[serde(default, rename = "finally", deserialize_with = "null_as_default")]
        always: Vec<Step>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },

    /// Run a nested pipeline in a fresh context seeded from `inputs`
    SubPipeline {
        pipeline: Box<Pipeline>,
        #[serde(default, deserialize_with = "null_as_default")]
        inputs: Map<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::Ability { .. } => StepKind::Ability,
            Step::Transform { .. } => StepKind::Transform,
            Step::Conditional { .. } => StepKind::Conditional,
            Step::Loop { .. } => StepKind::Loop,
            Step::Parallel { .. } => StepKind::Parallel,
            Step::TryCatch { .. } => StepKind::TryCatch,
            Step::SubPipeline { .. } => StepKind::SubPipeline,
        }
    }

    /// Name the step's result is bound under, if declared
    pub fn output(&self) -> Option<&str> {
        match self {
            Step::Ability { output, .. }
            | Step::Transform { output, .. }
            | Step::Conditional { output, .. }
            | Step::Loop { output, .. }
            | Step::Parallel { output, .. }
            | Step::TryCatch { output, .. }
            | Step::SubPipeline { output, .. } => output.as_deref(),
        }
    }

    /// Nested step lists, labelled by the field they come from
    pub fn children(&self) -> Vec<(&'static str, &[Step])> {
        match self {
            Step::Ability { .. } | Step::Transform { .. } => vec![],
            Step::Conditional { then, otherwise, .. } => {
                vec![("then", then.as_slice()), ("else", otherwise.as_slice())]
            }
            Step::Loop { steps, .. } => vec![("steps", steps.as_slice())],
            Step::Parallel { steps, .. } => vec![("steps", steps.as_slice())],
            Step::TryCatch { attempt, recover, always, .. } => {
                let mut children: Vec<(&'static str, &[Step])> = vec![("try", attempt.as_slice())];
                if let Some(recover) = recover {
                    children.push(("catch", recover.as_slice()));
                }
                children.push(("finally", always.as_slice()));
                children
            }
            Step::SubPipeline { pipeline, .. } => vec![("pipeline.steps", pipeline.steps.as_slice())],
        }
    }

    /// Count this step and every step nested below it
    pub fn total_steps(&self) -> usize {
        1 + self
            .children()
            .iter()
            .flat_map(|(_, steps)| steps.iter())
            .map(Step::total_steps)
            .sum::<usize>()
    }

    /// Short human-readable summary used in plans and logs
    pub fn describe(&self) -> String {
        match self {
            Step::Ability { ability, .. } => format!("call {}", ability),
            Step::Transform { operation, .. } => format!("transform {}", operation),
            Step::Conditional { then, otherwise, .. } => {
                format!("if ({} then / {} else)", then.len(), otherwise.len())
            }
            Step::Loop { input, item_var, .. } => {
                format!("for each ${} in {}", item_var, describe_value(input))
            }
            Step::Parallel { steps, .. } => format!("{} parallel branches", steps.len()),
            Step::TryCatch { recover, always, .. } => format!(
                "try{}{}",
                if recover.is_some() { " / catch" } else { "" },
                if always.is_empty() { "" } else { " / finally" }
            ),
            Step::SubPipeline { pipeline, .. } => match &pipeline.name {
                Some(name) => format!("sub-pipeline {}", name),
                None => format!("sub-pipeline ({} steps)", pipeline.steps.len()),
            },
        }
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
