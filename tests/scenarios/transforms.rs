//! Test: Transforms inside pipelines

use crate::helpers::*;
use serde_json::json;

#[tokio::test]
async fn test_report_pipeline() {
    let yaml = r#"
name: "Views report"
steps:
  - type: ability
    ability: posts/list
    output: posts
  - type: transform
    operation: sort
    input: $posts
    params: { field: views, order: desc }
    output: ranked
  - type: transform
    operation: pluck
    input: $ranked
    params: { field: title }
    output: titles
  - type: transform
    operation: join
    input: $titles
    params: { separator: " > " }
    output: ranking
  - type: transform
    operation: sum
    input: $posts
    params: { field: views }
    output: total_views
  - type: transform
    operation: average
    input: $posts
    params: { field: views }
    output: mean_views
  - type: transform
    operation: group_by
    input: $posts
    params: { field: status }
    output: by_status
output: ranking
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_success(&result);
    assert_eq!(result.result, json!("World > Again > Hello"));
    assert_variable(&result, "total_views", json!(302));
    assert_eq!(result.variable("mean_views").unwrap().as_f64().unwrap().round(), 101.0);
    assert_eq!(result.variable("by_status").unwrap()["draft"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_transform_is_pure_over_context() {
    let yaml = r#"
steps:
  - type: transform
    operation: reverse
    input: $items
    output: reversed
"#;

    let result = run_yaml(yaml, json!({"items": [1, 2, 3]})).await;

    assert_variable(&result, "items", json!([1, 2, 3]));
    assert_variable(&result, "reversed", json!([3, 2, 1]));
}

#[tokio::test]
async fn test_unknown_transform_fails_at_runtime() {
    let yaml = r#"
steps:
  - type: transform
    operation: explode
    input: []
"#;

    let result = run_yaml(yaml, json!({})).await;

    // an unknown operation is a validation warning, not an error
    assert!(!result.never_ran());
    assert_failed_with(&result, "UnrecoverableStepError", "unknown_transform");
}

#[tokio::test]
async fn test_filter_with_unknown_operator() {
    let yaml = r#"
steps:
  - type: transform
    operation: filter
    input: [1, 2]
    params: { operator: roughly, value: 1 }
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_failed_with(&result, "UnrecoverableStepError", "unknown_operator");
}

#[tokio::test]
async fn test_chunked_batches() {
    let yaml = r#"
steps:
  - type: transform
    operation: chunk
    input: $ids
    params: { size: 2 }
    output: batches
  - type: loop
    input: $batches
    steps:
      - type: transform
        operation: count
        input: $item
    output: sizes
"#;

    let result = run_yaml(yaml, json!({"ids": [1, 2, 3, 4, 5]})).await;

    assert_success(&result);
    assert_variable(&result, "sizes", json!([2, 2, 1]));
}
