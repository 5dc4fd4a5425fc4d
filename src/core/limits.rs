//! Resource limits for a single execution

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard ceilings applied to one `execute` call
///
/// Sub-pipelines share the same limits and the same running counters as the
/// pipeline that invoked them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionLimits {
    /// Maximum number of steps executed, counting nested and repeated steps
    pub max_steps: usize,

    /// Maximum nesting depth of step lists
    pub max_depth: usize,

    /// Wall-clock budget in seconds, checked between steps
    pub timeout_secs: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_steps: 1000,
            max_depth: 10,
            timeout_secs: 300,
        }
    }
}

impl ExecutionLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
