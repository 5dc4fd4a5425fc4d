//! Test: Limits - step budget, depth, and timeout are hard ceilings

use crate::helpers::*;
use ability_pipeline::{AbilityRegistry, ExecutionEngine, ExecutionLimits};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_step_limit_exceeded() {
    let result = run_with(&engine(), flat_steps(1001), json!({}), ExecutionLimits::default()).await;

    assert_failed_with(&result, "StepLimitExceeded", "step_limit_exceeded");
    assert_eq!(result.stats.steps_executed, 1000);
    assert_eq!(result.error.as_ref().unwrap().step.as_deref(), Some("steps[1000]"));
}

#[tokio::test]
async fn test_step_limit_exactly_reached_succeeds() {
    let result = run_with(&engine(), flat_steps(1000), json!({}), ExecutionLimits::default()).await;

    assert_success(&result);
    assert_eq!(result.stats.steps_executed, 1000);
}

#[tokio::test]
async fn test_loop_iterations_count_against_step_limit() {
    let yaml = r#"
steps:
  - type: loop
    input: $items
    steps:
      - type: ability
        ability: debug/echo
        input: $item
"#;
    let items: Vec<i64> = (0..10).collect();
    let limits = ExecutionLimits::default().with_max_steps(5);

    let result = run_yaml_with_limits(yaml, json!({"items": items}), limits).await;

    assert_failed_with(&result, "StepLimitExceeded", "step_limit_exceeded");
    assert_eq!(result.stats.count_for("loop"), 1);
    assert_eq!(result.stats.count_for("ability"), 4);
}

#[tokio::test]
async fn test_depth_limit_exceeded() {
    let result = run_with(&engine(), nested_steps(11), json!({}), ExecutionLimits::default()).await;

    assert_failed_with(&result, "DepthLimitExceeded", "depth_limit_exceeded");
    // try_catch cannot swallow a limit error
    assert_no_variable(&result, "leaf");
}

#[tokio::test]
async fn test_depth_at_limit_succeeds() {
    let result = run_with(&engine(), nested_steps(10), json!({}), ExecutionLimits::default()).await;

    assert_success(&result);
    assert_variable(&result, "leaf", json!("leaf"));
}

#[tokio::test]
async fn test_sub_pipeline_shares_step_budget() {
    let yaml = r#"
steps:
  - type: ability
    ability: debug/echo
  - type: sub_pipeline
    pipeline:
      steps:
        - type: ability
          ability: debug/echo
        - type: ability
          ability: debug/echo
"#;
    let limits = ExecutionLimits::default().with_max_steps(3);

    let result = run_yaml_with_limits(yaml, json!({}), limits).await;

    assert_failed_with(&result, "StepLimitExceeded", "step_limit_exceeded");
    assert_eq!(
        result.error.as_ref().unwrap().step.as_deref(),
        Some("steps[1].pipeline.steps[1]")
    );
}

#[tokio::test]
async fn test_timeout_checked_between_steps() {
    let registry = {
        let mut registry = AbilityRegistry::new();
        registry.register("slow/echo", Arc::new(SlowAbility::new(Duration::from_millis(1100))));
        registry
    };
    let engine = ExecutionEngine::new(registry);
    let definition = json!({"steps": [
        {"type": "ability", "ability": "slow/echo", "input": "first", "output": "first"},
        {"type": "ability", "ability": "slow/echo", "input": "second", "output": "second"}
    ]});

    let result = run_with(
        &engine,
        definition,
        json!({}),
        ExecutionLimits::default().with_timeout(1),
    )
    .await;

    assert_failed_with(&result, "TimeoutExceeded", "timeout_exceeded");
    // the running step was not interrupted
    assert_variable(&result, "first", json!("first"));
    assert_no_variable(&result, "second");
    assert!(result.stats.duration >= 1.0);
}
