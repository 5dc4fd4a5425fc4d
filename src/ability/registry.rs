//! In-memory ability registry

use crate::ability::{Ability, AbilityError, AbilityInvoker};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Ability backed by a plain function or closure
pub struct FnAbility<F> {
    func: F,
}

impl<F> FnAbility<F>
where
    F: Fn(Value) -> Result<Value, AbilityError> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Ability for FnAbility<F>
where
    F: Fn(Value) -> Result<Value, AbilityError> + Send + Sync,
{
    async fn execute(&self, input: Value) -> Result<Value, AbilityError> {
        (self.func)(input)
    }
}

/// Name-keyed set of abilities (for hosts and tests)
#[derive(Default, Clone)]
pub struct AbilityRegistry {
    abilities: HashMap<String, Arc<dyn Ability>>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ability under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, ability: Arc<dyn Ability>) {
        self.abilities.insert(name.into(), ability);
    }

    /// Register a closure as an ability
    pub fn register_fn<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Value) -> Result<Value, AbilityError> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnAbility::new(func)));
    }

    /// Builder-style [`register_fn`](Self::register_fn)
    pub fn with_fn<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, AbilityError> + Send + Sync + 'static,
    {
        self.register_fn(name, func);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.abilities.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

impl AbilityInvoker for AbilityRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Ability>> {
        self.abilities.get(name).cloned()
    }
}
