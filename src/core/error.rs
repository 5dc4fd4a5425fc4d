//! Engine error taxonomy

use crate::ability::AbilityError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating or executing a pipeline
#[derive(Debug, Error)]
pub enum EngineError {
    /// Structural problems found before execution
    #[error("Pipeline validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The definition passed validation but could not be decoded
    #[error("Invalid pipeline definition: {0}")]
    Definition(String),

    #[error("Variable '${name}' is not defined")]
    VariableNotFound { name: String },

    #[error("Unknown transform '{name}'")]
    UnknownTransform { name: String },

    #[error("Transform '{transform}' received invalid input: {message}")]
    InvalidTransformInput { transform: String, message: String },

    #[error("Unknown condition operator '{operator}'")]
    UnknownOperator { operator: String },

    #[error("Ability '{name}' not found")]
    AbilityNotFound { name: String },

    #[error("Ability '{ability}' failed: {source}")]
    AbilityExecution {
        ability: String,
        #[source]
        source: AbilityError,
    },

    /// A step received input of the wrong shape (e.g. a loop over a number)
    #[error("Invalid input for {step_type} step: {message}")]
    InvalidStepInput { step_type: String, message: String },

    #[error("Step limit of {limit} exceeded")]
    StepLimitExceeded { limit: usize },

    #[error("Depth limit of {limit} exceeded")]
    DepthLimitExceeded { limit: usize },

    #[error("Execution timed out after {seconds} seconds")]
    TimeoutExceeded { seconds: u64 },

    /// A step failure that reached the top of the pipeline without a try_catch
    #[error("Step {path} failed: {source}")]
    UnrecoverableStep {
        path: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Taxonomy name reported as the error `type`
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) | EngineError::Definition(_) => "ValidationError",
            EngineError::VariableNotFound { .. } => "VariableNotFound",
            EngineError::UnknownTransform { .. } => "UnknownTransform",
            EngineError::InvalidTransformInput { .. } => "InvalidTransformInput",
            EngineError::UnknownOperator { .. } => "UnknownOperator",
            EngineError::AbilityNotFound { .. } | EngineError::AbilityExecution { .. } => {
                "AbilityExecutionError"
            }
            EngineError::InvalidStepInput { .. } => "InvalidStepInput",
            EngineError::StepLimitExceeded { .. } => "StepLimitExceeded",
            EngineError::DepthLimitExceeded { .. } => "DepthLimitExceeded",
            EngineError::TimeoutExceeded { .. } => "TimeoutExceeded",
            EngineError::UnrecoverableStep { .. } => "UnrecoverableStepError",
        }
    }

    /// Machine-readable code reported as the error `code`
    ///
    /// Unrecoverable step errors report the code of the underlying failure.
    pub fn code(&self) -> String {
        match self {
            EngineError::Validation(_) => "validation_failed".to_string(),
            EngineError::Definition(_) => "invalid_definition".to_string(),
            EngineError::VariableNotFound { .. } => "variable_not_found".to_string(),
            EngineError::UnknownTransform { .. } => "unknown_transform".to_string(),
            EngineError::InvalidTransformInput { .. } => "invalid_transform_input".to_string(),
            EngineError::UnknownOperator { .. } => "unknown_operator".to_string(),
            EngineError::AbilityNotFound { .. } => "ability_not_found".to_string(),
            EngineError::AbilityExecution { source, .. } => source.code().to_string(),
            EngineError::InvalidStepInput { .. } => "invalid_step_input".to_string(),
            EngineError::StepLimitExceeded { .. } => "step_limit_exceeded".to_string(),
            EngineError::DepthLimitExceeded { .. } => "depth_limit_exceeded".to_string(),
            EngineError::TimeoutExceeded { .. } => "timeout_exceeded".to_string(),
            EngineError::UnrecoverableStep { source, .. } => source.code(),
        }
    }

    /// Resource-limit errors abort the whole execution and bypass try_catch
    pub fn is_fatal(&self) -> bool {
        match self {
            EngineError::StepLimitExceeded { .. }
            | EngineError::DepthLimitExceeded { .. }
            | EngineError::TimeoutExceeded { .. } => true,
            EngineError::UnrecoverableStep { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// The innermost error, looking through `UnrecoverableStep`
    pub fn root(&self) -> &EngineError {
        match self {
            EngineError::UnrecoverableStep { source, .. } => source.root(),
            other => other,
        }
    }

    /// Convert to the serializable error details exposed to callers and `$error`
    pub fn to_info(&self, step: Option<&str>) -> ErrorInfo {
        ErrorInfo {
            message: self.to_string(),
            error_type: self.kind().to_string(),
            code: self.code(),
            step: step.map(str::to_string),
        }
    }
}

/// Error details as reported in a failed execution result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,

    #[serde(rename = "type")]
    pub error_type: String,

    pub code: String,

    /// Path of the step that failed, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}
