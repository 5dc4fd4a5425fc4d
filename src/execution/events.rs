//! Execution events delivered to registered handlers while a pipeline runs

use crate::core::StepKind;
use std::sync::Arc;
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
        total_steps: usize,
    },
    StepStarted {
        path: String,
        step_type: StepKind,
        description: String,
        depth: usize,
    },
    StepCompleted {
        path: String,
        step_type: StepKind,
    },
    /// Emitted once, by the step where the error originated
    StepFailed {
        path: String,
        error: String,
    },
    /// A try_catch step caught an error and is running its catch branch
    ErrorRecovered {
        path: String,
        failed_step: String,
        error: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        success: bool,
        steps_executed: usize,
        duration: f64,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;
