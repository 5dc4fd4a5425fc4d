//! Execution statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Counters accumulated while a pipeline runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// When execution started
    pub started_at: DateTime<Utc>,

    /// Steps executed, including nested steps and every loop iteration
    pub steps_executed: usize,

    /// Elapsed wall-clock time in seconds
    pub duration: f64,

    /// Peak estimated context size in bytes (best effort)
    pub memory_peak: u64,

    /// Executed step count per step type
    pub steps_by_type: BTreeMap<String, usize>,
}

impl ExecutionStats {
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            started_at: Utc::now(),
            steps_executed: 0,
            duration: 0.0,
            memory_peak: 0,
            steps_by_type: BTreeMap::new(),
        }
    }

    /// Record one executed step
    pub fn record_step(&mut self, step_type: &str) {
        self.steps_executed += 1;
        *self.steps_by_type.entry(step_type.to_string()).or_insert(0) += 1;
    }

    pub fn observe_memory(&mut self, bytes: u64) {
        self.memory_peak = self.memory_peak.max(bytes);
    }

    /// Whether any step started before execution stopped
    pub fn has_run(&self) -> bool {
        self.steps_executed > 0
    }

    pub fn count_for(&self, step_type: &str) -> usize {
        self.steps_by_type.get(step_type).copied().unwrap_or(0)
    }
}

impl Default for ExecutionStats {
    fn default() -> Self {
        Self::new()
    }
}
