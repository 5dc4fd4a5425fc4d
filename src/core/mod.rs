//! Core domain models for pipelines
//!
//! This module defines the value helpers, scoped context, step tree and the
//! leaf components (variable resolution, conditions) the executor builds on.

pub mod condition;
pub mod context;
pub mod error;
pub mod limits;
pub mod pipeline;
pub mod stats;
pub mod step;
pub mod value;
pub mod variables;

pub use condition::{Condition, Comparison, Operator};
pub use context::PipelineContext;
pub use error::{EngineError, ErrorInfo};
pub use limits::ExecutionLimits;
pub use pipeline::Pipeline;
pub use stats::ExecutionStats;
pub use step::{Step, StepKind};
