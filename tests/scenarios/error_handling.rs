//! Test: Error Handling - try_catch recovery, finally, and uncaught failures

use crate::helpers::*;
use serde_json::json;

/// Try fetching a post that doesn't exist, create a fallback instead
#[tokio::test]
async fn test_fallback_post_on_missing_post() {
    let yaml = r#"
name: "Error handling"
steps:
  - type: try_catch
    try:
      - type: ability
        ability: posts/get
        input:
          id: 99999
        output: post
    catch:
      - type: ability
        ability: posts/create
        input:
          title: "Fallback post"
        output: post
      - type: ability
        ability: debug/echo
        input: $error.code
        output: reason
output: post
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_success(&result);
    assert_eq!(result.result["title"], json!("Fallback post"));
    assert_variable(&result, "reason", json!("rest_post_invalid_id"));
    assert_no_variable(&result, "error");
}

/// Without a try_catch, a failing ability aborts the pipeline
#[tokio::test]
async fn test_uncaught_failure_reports_step_and_code() {
    let yaml = r#"
steps:
  - type: ability
    ability: debug/echo
    input: "before"
    output: before
  - type: ability
    ability: posts/get
    input:
      id: 1
  - type: ability
    ability: debug/echo
    input: "after"
    output: after
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_failed_with(&result, "UnrecoverableStepError", "rest_post_invalid_id");
    let error = result.error.as_ref().unwrap();
    assert_eq!(error.step.as_deref(), Some("steps[1]"));
    assert!(error.message.contains("Invalid post ID 1."));

    // ran partially: the first step's output survives, the third never ran
    assert!(!result.never_ran());
    assert_eq!(result.stats.steps_executed, 2);
    assert_variable(&result, "before", json!("before"));
    assert_no_variable(&result, "after");
}

#[tokio::test]
async fn test_try_mutations_discarded_on_failure() {
    let yaml = r#"
steps:
  - type: try_catch
    try:
      - type: ability
        ability: debug/echo
        input: "half done"
        output: progress
      - type: ability
        ability: posts/get
    catch: []
"#;

    let result = run_yaml(yaml, json!({"progress": "untouched"})).await;

    assert_success(&result);
    assert_variable(&result, "progress", json!("untouched"));
}

#[tokio::test]
async fn test_try_mutations_kept_on_success() {
    let yaml = r#"
steps:
  - type: try_catch
    try:
      - type: ability
        ability: math/double
        input: { n: 4 }
        output: doubled
    catch:
      - type: ability
        ability: debug/echo
        input: "unused"
        output: fallback
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_success(&result);
    assert_variable(&result, "doubled", json!(8));
    assert_no_variable(&result, "fallback");
    assert_eq!(result.result, json!(8));
}

#[tokio::test]
async fn test_finally_runs_after_recovery() {
    let yaml = r#"
steps:
  - type: try_catch
    try:
      - type: ability
        ability: posts/get
    catch:
      - type: ability
        ability: debug/echo
        input: "recovered"
        output: status
    finally:
      - type: ability
        ability: debug/echo
        input: "cleaned up"
        output: cleanup
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_success(&result);
    assert_variable(&result, "status", json!("recovered"));
    assert_variable(&result, "cleanup", json!("cleaned up"));
}

#[tokio::test]
async fn test_failing_catch_propagates() {
    let yaml = r#"
steps:
  - type: try_catch
    try:
      - type: ability
        ability: posts/get
    catch:
      - type: transform
        operation: uppercase
        input: 42
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_failed_with(&result, "UnrecoverableStepError", "invalid_transform_input");
    assert_eq!(
        result.error.as_ref().unwrap().step.as_deref(),
        Some("steps[0].catch[0]")
    );
}

#[tokio::test]
async fn test_nested_try_catch_restores_outer_error() {
    let yaml = r#"
steps:
  - type: try_catch
    try:
      - type: ability
        ability: posts/get
        input: { id: 1 }
    catch:
      - type: try_catch
        try:
          - type: ability
            ability: missing/ability
        catch:
          - type: ability
            ability: debug/echo
            input: $error.code
            output: inner_code
      - type: ability
        ability: debug/echo
        input: $error.code
        output: outer_code
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_success(&result);
    assert_variable(&result, "inner_code", json!("ability_not_found"));
    assert_variable(&result, "outer_code", json!("rest_post_invalid_id"));
}

#[tokio::test]
async fn test_existing_error_variable_is_restored() {
    let yaml = r#"
steps:
  - type: try_catch
    try:
      - type: ability
        ability: posts/get
    catch: []
"#;

    let result = run_yaml(yaml, json!({"error": "user value"})).await;

    assert_success(&result);
    assert_variable(&result, "error", json!("user value"));
}
