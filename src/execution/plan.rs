//! Dry-run outline of a pipeline

use crate::core::{Pipeline, Step, StepKind};
use serde::Serialize;

/// One step in an outline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub path: String,
    pub depth: usize,
    pub step_type: StepKind,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Flat, depth-annotated view of every step a pipeline declares
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutline {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub total_steps: usize,
    pub max_nesting: usize,
    pub entries: Vec<PlanEntry>,
}

/// Outline `pipeline` without executing anything
pub fn outline(pipeline: &Pipeline) -> PlanOutline {
    let mut entries = Vec::with_capacity(pipeline.total_steps());
    collect(&pipeline.steps, "steps", 0, &mut entries);

    PlanOutline {
        name: pipeline.name.clone(),
        total_steps: pipeline.total_steps(),
        max_nesting: pipeline.max_nesting(),
        entries,
    }
}

fn collect(steps: &[Step], list_path: &str, depth: usize, entries: &mut Vec<PlanEntry>) {
    for (i, step) in steps.iter().enumerate() {
        let path = format!("{}[{}]", list_path, i);
        entries.push(PlanEntry {
            path: path.clone(),
            depth,
            step_type: step.kind(),
            summary: step.describe(),
            output: step.output().map(str::to_string),
        });
        for (label, children) in step.children() {
            collect(children, &format!("{}.{}", path, label), depth + 1, entries);
        }
    }
}
