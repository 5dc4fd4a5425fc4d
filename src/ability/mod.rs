//! Ability invocation - the collaborator seam the engine calls out through
//!
//! The engine never knows what an ability does. It resolves one by name and
//! executes it with a resolved input tree.

pub mod error;
pub mod fixtures;
pub mod registry;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub use error::AbilityError;
pub use fixtures::FixtureAbilities;
pub use registry::{AbilityRegistry, FnAbility};

/// A single callable ability
#[async_trait]
pub trait Ability: Send + Sync {
    /// Execute the ability with its resolved input
    async fn execute(&self, input: Value) -> Result<Value, AbilityError>;
}

/// Resolves abilities by name - allows for different registries
pub trait AbilityInvoker: Send + Sync {
    /// Look up an ability; `None` when no ability has that name
    fn resolve(&self, name: &str) -> Option<Arc<dyn Ability>>;

    fn has(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

impl<T: AbilityInvoker + ?Sized> AbilityInvoker for Arc<T> {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Ability>> {
        (**self).resolve(name)
    }
}
