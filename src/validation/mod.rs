//! Pipeline validation
//!
//! A structural pass over a raw definition tree, run before the tree is
//! decoded or executed. Every problem found is collected, so callers can
//! report them all at once.

use crate::core::{condition::Operator, step::StepKind};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Default ceiling on step-list nesting accepted by the validator
pub const DEFAULT_MAX_NESTING: usize = 32;

/// Outcome of a validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Pipeline validator
#[derive(Debug, Clone)]
pub struct PipelineValidator {
    max_nesting: usize,
    known_transforms: Option<HashSet<String>>,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Default for PipelineValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineValidator {
    pub fn new() -> Self {
        Self {
            max_nesting: DEFAULT_MAX_NESTING,
            known_transforms: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Reject definitions whose step lists nest deeper than `max_nesting`
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Warn about transform operations outside this set
    pub fn with_known_transforms<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_transforms = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Validate a definition, replacing any previous findings
    pub fn validate(&mut self, definition: &Value) -> bool {
        self.errors.clear();
        self.warnings.clear();
        self.check_pipeline(definition, "", 0);
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Snapshot of the last validation
    pub fn report(&self) -> ValidationReport {
        ValidationReport {
            valid: self.errors.is_empty(),
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
        }
    }

    fn add_error(&mut self, path: &str, message: impl AsRef<str>) {
        if path.is_empty() {
            self.errors.push(message.as_ref().to_string());
        } else {
            self.errors.push(format!("{}: {}", path, message.as_ref()));
        }
    }

    fn add_warning(&mut self, path: &str, message: impl AsRef<str>) {
        self.warnings.push(format!("{}: {}", path, message.as_ref()));
    }

    /// `prefix` is empty for the top-level pipeline, `steps[0].pipeline` for nested ones
    fn check_pipeline(&mut self, definition: &Value, prefix: &str, depth: usize) {
        let Some(object) = definition.as_object() else {
            self.add_error(prefix, "pipeline definition must be an object");
            return;
        };

        for key in ["name", "description", "output"] {
            if let Some(value) = object.get(key) {
                if !value.is_string() && !value.is_null() {
                    self.add_error(prefix, format!("'{}' must be a string", key));
                }
            }
        }
        if let Some(limits) = object.get("limits") {
            self.check_limits(limits, prefix);
        }

        let steps_path = join_path(prefix, "steps");
        match object.get("steps") {
            None => self.add_error(prefix, "pipeline must define a 'steps' list"),
            Some(Value::Array(steps)) if steps.is_empty() => {
                self.add_error(prefix, "pipeline 'steps' must not be empty")
            }
            Some(Value::Array(steps)) => self.check_steps(steps, &steps_path, depth),
            Some(_) => self.add_error(prefix, "'steps' must be a list"),
        }
    }

    fn check_limits(&mut self, limits: &Value, prefix: &str) {
        let Some(limits) = limits.as_object() else {
            self.add_error(prefix, "'limits' must be an object");
            return;
        };
        for key in ["max_steps", "max_depth", "timeout_secs"] {
            if let Some(value) = limits.get(key) {
                if value.as_u64().is_none() {
                    self.add_error(prefix, format!("limit '{}' must be a non-negative integer", key));
                }
            }
        }
    }

    fn check_steps(&mut self, steps: &[Value], path: &str, depth: usize) {
        if depth > self.max_nesting {
            self.add_error(
                path,
                format!("steps nest deeper than the maximum of {}", self.max_nesting),
            );
            return;
        }
        for (i, step) in steps.iter().enumerate() {
            self.check_step(step, &format!("{}[{}]", path, i), depth);
        }
    }

    /// Validate an optional nested step list
    fn check_step_list(
        &mut self,
        step: &Map<String, Value>,
        key: &str,
        path: &str,
        depth: usize,
        required: bool,
    ) {
        let list_path = join_path(path, key);
        match step.get(key) {
            None | Some(Value::Null) if required => {
                self.add_error(path, format!("missing required field '{}'", key))
            }
            None | Some(Value::Null) => {}
            Some(Value::Array(steps)) => {
                if required && steps.is_empty() {
                    self.add_error(path, format!("'{}' must contain at least one step", key));
                }
                self.check_steps(steps, &list_path, depth + 1);
            }
            Some(_) => self.add_error(path, format!("'{}' must be a list of steps", key)),
        }
    }

    fn check_step(&mut self, step: &Value, path: &str, depth: usize) {
        let Some(object) = step.as_object() else {
            self.add_error(path, "step must be an object");
            return;
        };

        let kind = match object.get("type") {
            None => {
                self.add_error(path, "step is missing 'type'");
                return;
            }
            Some(Value::String(name)) => match StepKind::parse(name) {
                Some(kind) => kind,
                None => {
                    self.add_error(path, format!("unknown step type '{}'", name));
                    return;
                }
            },
            Some(other) => {
                self.add_error(path, format!("step type must be a string, got {}", other));
                return;
            }
        };

        self.check_optional_string(object, "output", path);

        match kind {
            StepKind::Ability => {
                match object.get("ability") {
                    Some(Value::String(name)) if !name.is_empty() => {}
                    Some(Value::String(_)) => self.add_error(path, "ability name must not be empty"),
                    Some(_) => self.add_error(path, "'ability' must be a string"),
                    None => self.add_error(path, "missing required field 'ability'"),
                }
            }
            StepKind::Transform => {
                match object.get("operation") {
                    Some(Value::String(operation)) => {
                        if let Some(known) = &self.known_transforms {
                            if !known.contains(operation) {
                                self.add_warning(path, format!("unknown transform '{}'", operation));
                            }
                        }
                    }
                    Some(_) => self.add_error(path, "'operation' must be a string"),
                    None => self.add_error(path, "missing required field 'operation'"),
                }
                if !object.contains_key("input") {
                    self.add_error(path, "missing required field 'input'");
                }
                self.check_optional_object(object, "params", path);
            }
            StepKind::Conditional => {
                match object.get("condition") {
                    Some(condition) => {
                        let condition_path = join_path(path, "condition");
                        self.check_condition(condition, &condition_path);
                    }
                    None => self.add_error(path, "missing required field 'condition'"),
                }
                self.check_step_list(object, "then", path, depth, false);
                self.check_step_list(object, "else", path, depth, false);
            }
            StepKind::Loop => {
                if !object.contains_key("input") {
                    self.add_error(path, "missing required field 'input'");
                }
                for key in ["item_var", "itemVar", "index_var", "indexVar", "collect"] {
                    self.check_optional_string(object, key, path);
                }
                self.check_step_list(object, "steps", path, depth, true);
            }
            StepKind::Parallel => {
                if let Some(Value::Array(steps)) = object.get("steps") {
                    if steps.is_empty() {
                        self.add_warning(path, "parallel step has no branches");
                    }
                }
                self.check_step_list(object, "steps", path, depth, false);
                if !object.contains_key("steps") {
                    self.add_error(path, "missing required field 'steps'");
                }
            }
            StepKind::TryCatch => {
                self.check_step_list(object, "try", path, depth, true);
                self.check_step_list(object, "catch", path, depth, false);
                self.check_step_list(object, "finally", path, depth, false);
            }
            StepKind::SubPipeline => {
                match object.get("pipeline") {
                    Some(pipeline) => {
                        let nested = join_path(path, "pipeline");
                        self.check_pipeline(pipeline, &nested, depth + 1);
                    }
                    None => self.add_error(path, "missing required field 'pipeline'"),
                }
                self.check_optional_object(object, "inputs", path);
            }
        }
    }

    fn check_condition(&mut self, condition: &Value, path: &str) {
        match condition {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.check_condition(item, &format!("{}[{}]", path, i));
                }
            }
            Value::Object(object) => {
                if let Some(group) = object.get("and").or_else(|| object.get("or")) {
                    match group {
                        Value::Array(_) => self.check_condition(group, path),
                        _ => self.add_error(path, "'and'/'or' must be a list of conditions"),
                    }
                } else if let Some(inner) = object.get("not") {
                    self.check_condition(inner, path);
                } else if object.contains_key("field") {
                    match object.get("operator") {
                        None => {}
                        Some(Value::String(op)) if Operator::is_known(op) => {}
                        Some(Value::String(op)) => {
                            self.add_warning(path, format!("unknown operator '{}'", op))
                        }
                        Some(_) => self.add_error(path, "'operator' must be a string"),
                    }
                } else {
                    self.add_error(path, "condition needs 'field', 'and', 'or' or 'not'");
                }
            }
            _ => self.add_error(path, "condition must be an object or a list"),
        }
    }

    fn check_optional_string(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        if let Some(value) = object.get(key) {
            if !value.is_string() && !value.is_null() {
                self.add_error(path, format!("'{}' must be a string", key));
            }
        }
    }

    fn check_optional_object(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        if let Some(value) = object.get(key) {
            if !value.is_object() && !value.is_null() {
                self.add_error(path, format!("'{}' must be an object", key));
            }
        }
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
