//! ability-pipeline - a declarative pipeline engine that chains abilities
//! with transforms, conditionals, loops, parallel branches and error recovery

pub mod ability;
pub mod cli;
pub mod core;
pub mod execution;
pub mod transform;
pub mod validation;

// Re-export commonly used types
pub use crate::ability::{Ability, AbilityError, AbilityInvoker, AbilityRegistry, FixtureAbilities};
pub use crate::core::{
    Condition, EngineError, ErrorInfo, ExecutionLimits, ExecutionStats, Pipeline, PipelineContext,
    Step, StepKind,
};
pub use crate::execution::{ExecutionEngine, ExecutionEvent, ExecutionResult};
pub use crate::transform::TransformRegistry;
pub use crate::validation::{PipelineValidator, ValidationReport};
