//! CLI output formatting

use crate::{
    core::{ErrorInfo, ExecutionStats},
    execution::{ExecutionEvent, PlanEntry},
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Spinner shown while a pipeline runs
pub fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Indentation for a step path such as `steps[0].then[1]`
fn indent(path: &str) -> String {
    "  ".repeat(path.matches('[').count().saturating_sub(1))
}

/// Format an execution event for display; `None` for events not worth a line
pub fn format_execution_event(event: &ExecutionEvent) -> Option<String> {
    let line = match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name,
            total_steps,
        } => format!(
            "{} Starting pipeline {} ({} steps, {})",
            ROCKET,
            style(pipeline_name).bold(),
            total_steps,
            style(&execution_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StepStarted { .. } => return None,
        ExecutionEvent::StepCompleted { path, step_type } => format!(
            "{}{} {} {}",
            indent(path),
            CHECK,
            style(path).green(),
            style(step_type).dim()
        ),
        ExecutionEvent::StepFailed { path, error } => format!(
            "{}{} {}: {}",
            indent(path),
            CROSS,
            style(path).red(),
            style(error).dim()
        ),
        ExecutionEvent::ErrorRecovered {
            path,
            failed_step,
            error,
        } => format!(
            "{}{} {} caught error from {}: {}",
            indent(path),
            WARN,
            style(path).yellow(),
            style(failed_step).cyan(),
            style(error).dim()
        ),
        ExecutionEvent::PipelineCompleted {
            execution_id,
            success,
            steps_executed,
            duration,
        } => {
            let status = if *success {
                format!("{} completed", style("successfully").green())
            } else {
                style("failed").red().to_string()
            };
            format!(
                "{} Pipeline ({}) {} after {} steps in {:.2}s",
                INFO,
                style(&execution_id.to_string()[..8]).dim(),
                status,
                steps_executed,
                duration
            )
        }
    };
    Some(line)
}

/// Spinner message for a starting step
pub fn format_step_started(event: &ExecutionEvent) -> Option<String> {
    match event {
        ExecutionEvent::StepStarted {
            path, description, ..
        } => Some(format!("{} {}", style(path).cyan(), description)),
        _ => None,
    }
}

/// Pretty-print a value, truncated to `max_lines`
pub fn format_value(value: &Value, max_lines: usize) -> String {
    let output = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}

pub fn format_stats(stats: &ExecutionStats) -> String {
    let by_type: Vec<String> = stats
        .steps_by_type
        .iter()
        .map(|(kind, count)| format!("{} {}", count, kind))
        .collect();
    format!(
        "{} steps ({}) in {:.3}s, peak context ~{} bytes",
        style(stats.steps_executed).cyan(),
        by_type.join(", "),
        stats.duration,
        stats.memory_peak
    )
}

pub fn format_error(error: &ErrorInfo) -> String {
    let location = error
        .step
        .as_deref()
        .map(|step| format!(" at {}", style(step).cyan()))
        .unwrap_or_default();
    format!(
        "{} [{}/{}]{}: {}",
        CROSS,
        style(&error.error_type).red(),
        style(&error.code).dim(),
        location,
        error.message
    )
}

pub fn format_plan_entry(entry: &PlanEntry) -> String {
    let output = entry
        .output
        .as_deref()
        .map(|name| format!(" -> ${}", style(name).green()))
        .unwrap_or_default();
    format!(
        "{}{} {} {}{}",
        "  ".repeat(entry.depth),
        style(&entry.path).dim(),
        style(entry.step_type).cyan(),
        entry.summary,
        output
    )
}
