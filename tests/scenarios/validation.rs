//! Test: Validation - malformed pipelines never run

use crate::helpers::*;
use ability_pipeline::{ExecutionLimits, PipelineValidator};
use serde_json::json;

#[tokio::test]
async fn test_missing_steps_rejected_before_running() {
    let result = run_yaml("name: \"Empty\"", json!({"keep": 1})).await;

    assert_failed_with(&result, "ValidationError", "validation_failed");
    assert!(result.never_ran());
    assert_eq!(result.stats.steps_executed, 0);
    assert_variable(&result, "keep", json!(1));
    assert!(result
        .error
        .as_ref()
        .unwrap()
        .message
        .contains("pipeline must define a 'steps' list"));
}

#[tokio::test]
async fn test_one_bad_step_blocks_the_whole_pipeline() {
    let yaml = r#"
steps:
  - type: ability
    ability: posts/create
    input: { title: "never created" }
    output: created
  - type: shell
    command: "rm -rf /"
"#;

    let result = run_yaml(yaml, json!({})).await;

    assert_failed_with(&result, "ValidationError", "validation_failed");
    assert_no_variable(&result, "created");
    assert!(result
        .error
        .as_ref()
        .unwrap()
        .message
        .contains("steps[1]: unknown step type 'shell'"));
}

#[test]
fn test_distinct_errors_per_problem() {
    let cases = [
        (json!({"name": "x"}), "pipeline must define a 'steps' list"),
        (
            json!({"steps": [{"type": "shell"}]}),
            "steps[0]: unknown step type 'shell'",
        ),
        (
            json!({"steps": [{"type": "loop", "steps": [{"type": "ability", "ability": "debug/echo"}]}]}),
            "steps[0]: missing required field 'input'",
        ),
    ];

    let mut seen = Vec::new();
    for (definition, expected) in cases {
        let mut validator = PipelineValidator::new();
        assert!(!validator.validate(&definition));
        assert_eq!(validator.errors(), [expected]);
        seen.push(expected);
    }
    seen.dedup();
    assert_eq!(seen.len(), 3);
}

#[test]
fn test_engine_validator_knows_registered_transforms() {
    let definition = json!({"steps": [
        {"type": "transform", "operation": "unique", "input": []},
        {"type": "transform", "operation": "shuffle", "input": []}
    ]});

    let mut validator = engine().validator();

    assert!(validator.validate(&definition));
    assert_eq!(validator.warnings(), ["steps[1]: unknown transform 'shuffle'"]);
}

#[test]
fn test_report_serializes_findings() {
    let mut validator = PipelineValidator::new();
    validator.validate(&json!({"steps": []}));

    let report = serde_json::to_value(validator.report()).unwrap();

    assert_eq!(report["valid"], json!(false));
    assert_eq!(report["errors"], json!(["pipeline 'steps' must not be empty"]));
}

#[tokio::test]
async fn test_null_optional_fields_validate_and_run() {
    let definitions = [
        json!({"steps": [{"type": "transform", "operation": "count", "input": [1, 2], "params": null}]}),
        json!({"steps": [{"type": "try_catch", "try": [{"type": "ability", "ability": "debug/echo"}], "finally": null}]}),
        json!({"steps": [{"type": "sub_pipeline", "inputs": null, "pipeline": {"steps": [{"type": "ability", "ability": "debug/echo"}]}}]}),
        json!({"steps": [{"type": "loop", "input": [1], "item_var": null, "steps": [{"type": "ability", "ability": "debug/echo", "input": "$item"}]}]}),
        json!({"steps": [{"type": "conditional", "condition": {"field": true}, "then": null, "else": null}]}),
        json!({"steps": [{"type": "parallel", "steps": null}]}),
    ];

    for definition in definitions {
        let mut validator = engine().validator();
        assert!(validator.validate(&definition), "{:?}", validator.errors());

        let result = run_with(&engine(), definition, json!({}), ExecutionLimits::default()).await;
        assert_success(&result);
    }
}
