//! Test utility functions for ability-pipeline
#![allow(dead_code)]

use ability_pipeline::{
    ability::{Ability, AbilityError, AbilityRegistry},
    core::pipeline::parse_definition,
    ExecutionEngine, ExecutionLimits, ExecutionResult,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Ability that sleeps before echoing its input
pub struct SlowAbility {
    delay: Duration,
}

impl SlowAbility {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Ability for SlowAbility {
    async fn execute(&self, input: Value) -> Result<Value, AbilityError> {
        tokio::time::sleep(self.delay).await;
        Ok(input)
    }
}

/// Ability that records every input it receives
#[derive(Clone, Default)]
pub struct RecordingAbility {
    calls: Arc<Mutex<Vec<Value>>>,
}

impl RecordingAbility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ability for RecordingAbility {
    async fn execute(&self, input: Value) -> Result<Value, AbilityError> {
        self.calls.lock().unwrap().push(input.clone());
        Ok(input)
    }
}

/// Abilities standing in for a small content site
///
/// - `math/double`: `{n}` -> `n * 2`
/// - `posts/get`: always fails with `not_found`
/// - `posts/create`: returns a new post built from `{title}`
/// - `posts/list`: returns three posts
/// - `debug/echo`: returns its input
pub fn mock_abilities() -> AbilityRegistry {
    let next_id = Arc::new(AtomicUsize::new(100));

    AbilityRegistry::new()
        .with_fn("math/double", |input| {
            let n = input
                .get("n")
                .and_then(Value::as_i64)
                .ok_or_else(|| AbilityError::InvalidInput("n must be an integer".to_string()))?;
            Ok(json!(n * 2))
        })
        .with_fn("posts/get", |input| {
            Err(AbilityError::failed(
                "rest_post_invalid_id",
                format!("Invalid post ID {}.", input["id"]),
            ))
        })
        .with_fn("posts/create", move |input| {
            let id = next_id.fetch_add(1, Ordering::SeqCst);
            Ok(json!({
                "ID": id,
                "title": input["title"].clone(),
                "status": input.get("status").cloned().unwrap_or(json!("draft"))
            }))
        })
        .with_fn("posts/list", |_| {
            Ok(json!([
                {"ID": 1, "title": "Hello", "status": "draft", "views": 12},
                {"ID": 2, "title": "World", "status": "publish", "views": 250},
                {"ID": 3, "title": "Again", "status": "draft", "views": 40}
            ]))
        })
        .with_fn("debug/echo", Ok)
}

pub fn engine() -> ExecutionEngine<AbilityRegistry> {
    ExecutionEngine::new(mock_abilities())
}

/// Run a YAML/JSON pipeline with the mock abilities and default limits
pub async fn run_yaml(yaml: &str, context: Value) -> ExecutionResult {
    run_yaml_with_limits(yaml, context, ExecutionLimits::default()).await
}

pub async fn run_yaml_with_limits(
    yaml: &str,
    context: Value,
    limits: ExecutionLimits,
) -> ExecutionResult {
    let definition = parse_definition(yaml).expect("pipeline should parse");
    engine().execute(&definition, context, &limits).await
}

/// Run a definition value with a given engine
pub async fn run_with<A: ability_pipeline::AbilityInvoker>(
    engine: &ExecutionEngine<A>,
    definition: Value,
    context: Value,
    limits: ExecutionLimits,
) -> ExecutionResult {
    engine.execute(&definition, context, &limits).await
}

/// `count` ability steps in sequence
pub fn flat_steps(count: usize) -> Value {
    let steps: Vec<Value> = (0..count)
        .map(|_| json!({"type": "ability", "ability": "debug/echo", "input": 1}))
        .collect();
    json!({ "steps": steps })
}

/// An ability step wrapped in `levels` try_catch steps
pub fn nested_steps(levels: usize) -> Value {
    let mut step = json!({"type": "ability", "ability": "debug/echo", "input": "leaf", "output": "leaf"});
    for _ in 0..levels {
        step = json!({"type": "try_catch", "try": [step], "catch": []});
    }
    json!({ "steps": [step] })
}

/// Assert the pipeline completed
pub fn assert_success(result: &ExecutionResult) {
    assert!(
        result.success,
        "Expected success, got error: {:?}",
        result.error
    );
}

/// Assert the pipeline failed with the given error type and code
pub fn assert_failed_with(result: &ExecutionResult, error_type: &str, code: &str) {
    assert!(!result.success, "Expected failure, got result {}", result.result);
    let error = result.error.as_ref().expect("failed result carries an error");
    assert_eq!(error.error_type, error_type, "unexpected error: {:?}", error);
    assert_eq!(error.code, code, "unexpected error: {:?}", error);
}

/// Assert a context variable holds `expected`
pub fn assert_variable(result: &ExecutionResult, name: &str, expected: Value) {
    assert_eq!(
        result.variable(name),
        Some(&expected),
        "variable ${} in context {}",
        name,
        result.context
    );
}

pub fn assert_no_variable(result: &ExecutionResult, name: &str) {
    assert!(
        result.variable(name).is_none(),
        "expected ${} to be unset, context {}",
        name,
        result.context
    );
}
