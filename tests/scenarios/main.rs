//! Scenario-based tests for ability-pipeline

#[path = "../helpers.rs"]
mod helpers;

mod error_handling;
mod limits;
mod parallel;
mod transforms;
mod validation;
mod variable_substitution;
