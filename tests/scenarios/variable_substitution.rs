//! Test: Variable substitution - whole-string references keep their type

use crate::helpers::*;
use ability_pipeline::{AbilityRegistry, ExecutionEngine, ExecutionLimits};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_reference_keeps_native_type() {
    let recorder = RecordingAbility::new();
    let mut registry = AbilityRegistry::new();
    registry.register("record", Arc::new(recorder.clone()));
    let engine = ExecutionEngine::new(registry);

    let definition = json!({"steps": [{
        "type": "ability",
        "ability": "record",
        "input": {
            "id": "$post.ID",
            "tags": "$post.tags",
            "missing": "$post.missing",
            "label": "Post $post.ID",
            "nested": ["$post.status", {"first_tag": "$post.tags.0"}]
        }
    }]});
    let context = json!({"post": {"ID": 42, "status": "draft", "tags": ["a", "b"]}});

    let result = run_with(&engine, definition, context, ExecutionLimits::default()).await;

    assert_success(&result);
    assert_eq!(
        recorder.calls(),
        vec![json!({
            "id": 42,
            "tags": ["a", "b"],
            "missing": null,
            "label": "Post $post.ID",
            "nested": ["draft", {"first_tag": "a"}]
        })]
    );
}

#[tokio::test]
async fn test_undefined_root_fails_step() {
    let yaml = r#"
steps:
  - type: ability
    ability: debug/echo
    input: $missing_root.ID
"#;

    let result = run_yaml(yaml, json!({"post": {"ID": 1}})).await;

    assert_failed_with(&result, "UnrecoverableStepError", "variable_not_found");
    assert!(result.error.as_ref().unwrap().message.contains("$missing_root"));
}

#[tokio::test]
async fn test_outputs_feed_later_steps() {
    let yaml = r#"
steps:
  - type: ability
    ability: posts/create
    input:
      title: $title
    output: post
  - type: ability
    ability: math/double
    input:
      n: $post.ID
    output: doubled_id
output: doubled_id
"#;

    let result = run_yaml(yaml, json!({"title": "Draft"})).await;

    assert_success(&result);
    assert_variable(&result, "post", json!({"ID": 100, "title": "Draft", "status": "draft"}));
    assert_eq!(result.result, json!(200));
}

#[tokio::test]
async fn test_step_without_output_leaves_context_unchanged() {
    let yaml = r#"
steps:
  - type: ability
    ability: debug/echo
    input: "transient"
"#;

    let result = run_yaml(yaml, json!({"a": 1})).await;

    assert_success(&result);
    assert_eq!(result.context, json!({"a": 1}));
    assert_eq!(result.result, json!("transient"));
}
