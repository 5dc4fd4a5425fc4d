//! Test: Parallel - isolated branches, deterministic merge, collect-then-fail

use crate::helpers::*;
use ability_pipeline::{AbilityRegistry, ExecutionEngine, ExecutionLimits};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_later_branch_wins_on_shared_output() {
    let yaml = r#"
steps:
  - type: parallel
    steps:
      - type: ability
        ability: debug/echo
        input: "from first"
        output: x
      - type: ability
        ability: debug/echo
        input: "from second"
        output: x
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_success(&result);
    assert_variable(&result, "x", json!("from second"));
    assert_eq!(result.result, json!(["from first", "from second"]));
}

#[tokio::test]
async fn test_branches_do_not_observe_each_other() {
    let yaml = r#"
steps:
  - type: parallel
    steps:
      - type: ability
        ability: debug/echo
        input: "written"
        output: shared
      - type: conditional
        condition:
          field: $shared
          operator: equals
          value: "written"
        then:
          - type: ability
            ability: debug/echo
            input: true
            output: saw_write
        else:
          - type: ability
            ability: debug/echo
            input: false
            output: saw_write
        output: check
"#;

    let result = run_yaml(yaml, json!({"shared": "original"})).await;

    assert_success(&result);
    assert_variable(&result, "shared", json!("written"));
    // only the branch step's declared output is merged back
    assert_variable(&result, "check", json!(false));
    assert_no_variable(&result, "saw_write");
}

#[tokio::test]
async fn test_failed_branch_fails_step_after_all_finish() {
    let yaml = r#"
steps:
  - type: parallel
    steps:
      - type: ability
        ability: posts/get
        input: { id: 7 }
      - type: ability
        ability: math/double
        input: { n: 21 }
        output: answer
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_failed_with(&result, "UnrecoverableStepError", "rest_post_invalid_id");
    assert_eq!(result.stats.count_for("ability"), 2);
    assert_variable(&result, "answer", json!(42));
}

#[tokio::test]
async fn test_first_declared_failure_is_reported() {
    let yaml = r#"
steps:
  - type: parallel
    steps:
      - type: ability
        ability: debug/echo
      - type: ability
        ability: missing/one
      - type: ability
        ability: posts/get
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_failed_with(&result, "UnrecoverableStepError", "ability_not_found");
    assert_eq!(result.error.as_ref().unwrap().step.as_deref(), Some("steps[0].steps[1]"));
}

#[tokio::test]
async fn test_branches_run_concurrently() {
    let registry = {
        let mut registry = AbilityRegistry::new();
        registry.register("slow/echo", Arc::new(SlowAbility::new(Duration::from_millis(300))));
        registry
    };
    let engine = ExecutionEngine::new(registry);
    let definition = json!({"steps": [{
        "type": "parallel",
        "steps": [
            {"type": "ability", "ability": "slow/echo", "input": 1, "output": "a"},
            {"type": "ability", "ability": "slow/echo", "input": 2, "output": "b"},
            {"type": "ability", "ability": "slow/echo", "input": 3, "output": "c"}
        ]
    }]});

    let started = Instant::now();
    let result = run_with(&engine, definition, json!({}), ExecutionLimits::default()).await;

    assert_success(&result);
    assert_variable(&result, "c", json!(3));
    assert!(started.elapsed() < Duration::from_millis(850));
}

#[tokio::test]
async fn test_parallel_inside_try_catch_recovers() {
    let yaml = r#"
steps:
  - type: try_catch
    try:
      - type: parallel
        steps:
          - type: ability
            ability: posts/get
          - type: ability
            ability: debug/echo
            input: "ok"
            output: partial
    catch:
      - type: ability
        ability: debug/echo
        input: $error.step
        output: failed_at
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_success(&result);
    assert_variable(&result, "failed_at", json!("steps[0].try[0].steps[0]"));
    // the try scope was discarded along with the merged branch output
    assert_no_variable(&result, "partial");
}
