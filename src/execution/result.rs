//! Result of one `execute` call

use crate::core::{ErrorInfo, ExecutionStats};
use serde::Serialize;
use serde_json::Value;

/// What an execution produced
///
/// On failure `result` is null, `context` holds whatever the top-level scope
/// contained when execution stopped, and `stats` are partial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub result: Value,
    pub context: Value,
    pub stats: ExecutionStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ExecutionResult {
    pub fn completed(result: Value, context: Value, stats: ExecutionStats) -> Self {
        Self {
            success: true,
            result,
            context,
            stats,
            error: None,
        }
    }

    pub fn failed(error: ErrorInfo, context: Value, stats: ExecutionStats) -> Self {
        Self {
            success: false,
            result: Value::Null,
            context,
            stats,
            error: Some(error),
        }
    }

    /// Error `type`, if the execution failed
    pub fn error_type(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.error_type.as_str())
    }

    /// Failed before a single step started (e.g. validation)
    pub fn never_ran(&self) -> bool {
        !self.success && !self.stats.has_run()
    }

    /// Look up a variable in the final context
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.context.get(name)
    }
}
