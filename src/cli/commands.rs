//! CLI command definitions

use crate::core::ExecutionLimits;
use clap::Args;
use serde_json::Value;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML/JSON file
    #[arg(short, long)]
    pub file: String,

    /// Initial context file (YAML/JSON object)
    #[arg(short, long)]
    pub context: Option<String>,

    /// Ability fixture file mapping ability names to canned results
    #[arg(short, long)]
    pub abilities: Option<String>,

    /// Context variable overrides (key=value, value parsed as JSON when possible)
    #[arg(long = "var", value_parser = parse_key_value)]
    pub variables: Vec<(String, Value)>,

    /// Maximum number of executed steps
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Maximum nesting depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the execution result as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    /// Flags override the pipeline file's `limits`, which override the defaults
    pub fn limits(&self, from_file: Option<ExecutionLimits>) -> ExecutionLimits {
        let mut limits = from_file.unwrap_or_default();
        if let Some(max_steps) = self.max_steps {
            limits = limits.with_max_steps(max_steps);
        }
        if let Some(max_depth) = self.max_depth {
            limits = limits.with_max_depth(max_depth);
        }
        if let Some(timeout) = self.timeout {
            limits = limits.with_timeout(timeout);
        }
        limits
    }
}

/// Validate a pipeline definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML/JSON file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show the steps a pipeline would run, without running them
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Path to pipeline YAML/JSON file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs; the value is JSON if it parses as JSON, else a string
pub fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid key=value pair: {}", s))?;
    if key.is_empty() {
        return Err(format!("Missing variable name in: {}", s));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
