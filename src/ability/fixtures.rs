//! Fixture-backed abilities for running pipelines outside a host
//!
//! A fixture file maps ability names to canned behaviour:
//!
//! ```yaml
//! posts/get:
//!   result: { ID: 5, title: "Hello" }
//! posts/delete:
//!   error: { code: forbidden, message: "Not allowed" }
//! debug/echo:
//!   echo: true
//! ```

use crate::ability::{Ability, AbilityError, AbilityInvoker};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

fn default_error_code() -> String {
    "fixture_error".to_string()
}

/// Error a fixture reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureError {
    #[serde(default = "default_error_code")]
    pub code: String,
    pub message: String,
}

/// Canned behaviour for one ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fixture {
    Error { error: FixtureError },
    Echo { echo: bool },
    Result { result: Value },
}

#[async_trait]
impl Ability for Fixture {
    async fn execute(&self, input: Value) -> Result<Value, AbilityError> {
        match self {
            Fixture::Error { error } => Err(AbilityError::failed(&error.code, &error.message)),
            Fixture::Echo { echo: true } => Ok(input),
            Fixture::Echo { echo: false } => Ok(Value::Null),
            Fixture::Result { result } => Ok(result.clone()),
        }
    }
}

/// Invoker serving abilities from a fixture map
#[derive(Debug, Clone, Default)]
pub struct FixtureAbilities {
    fixtures: HashMap<String, Arc<Fixture>>,
}

impl FixtureAbilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fixtures from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read abilities file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse abilities file {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let fixtures: HashMap<String, Fixture> = serde_yaml::from_str(yaml)?;
        Ok(Self {
            fixtures: fixtures
                .into_iter()
                .map(|(name, fixture)| (name, Arc::new(fixture)))
                .collect(),
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, fixture: Fixture) {
        self.fixtures.insert(name.into(), Arc::new(fixture));
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

impl AbilityInvoker for FixtureAbilities {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Ability>> {
        self.fixtures
            .get(name)
            .map(|fixture| fixture.clone() as Arc<dyn Ability>)
    }
}
