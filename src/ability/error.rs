//! Ability error types

use thiserror::Error;

/// Error types reported by abilities
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbilityError {
    /// The ability ran and reported a failure
    #[error("{message}")]
    Failed { code: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AbilityError {
    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        AbilityError::Failed {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Machine-readable code
    pub fn code(&self) -> &str {
        match self {
            AbilityError::Failed { code, .. } => code,
            AbilityError::InvalidInput(_) => "invalid_input",
            AbilityError::Internal(_) => "ability_error",
        }
    }
}
