//! Pipeline execution engine

pub mod engine;
pub mod events;
pub mod plan;
pub mod result;

pub use engine::ExecutionEngine;
pub use events::{EventHandler, ExecutionEvent};
pub use plan::{outline, PlanEntry, PlanOutline};
pub use result::ExecutionResult;
