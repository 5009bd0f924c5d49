//! Named condition and action implementations.
//!
//! Rule sources refer to conditions and actions by type name; the registries
//! map those names to trait objects. Both registries are populated once at
//! start-up and are read-only afterwards.

mod params;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bookwatch_notify::TemplateRenderer;
use serde_json::Value;

use crate::context::BookingContext;
use crate::error::{ActionError, ConditionError};
use crate::schema::{StoreProfile, TemplateCatalog};

pub use params::{ParamKind, ParamSpec, Params};

/// Read-only view of the rule document handed to load-time checks.
pub struct CheckScope<'a> {
    pub templates: &'a TemplateCatalog,
    pub renderer: &'a TemplateRenderer,
}

/// What an action may consult besides the booking itself.
pub struct ActionEnv<'a> {
    pub rule_name: &'a str,
    pub templates: &'a TemplateCatalog,
    pub store: Option<&'a StoreProfile>,
    pub renderer: &'a TemplateRenderer,
}

/// A pure predicate over a booking context.
///
/// Implementations receive `&BookingContext` and may read collaborators but
/// never write through them.
#[async_trait]
pub trait Condition: Send + Sync {
    /// Type name used in rule sources.
    fn name(&self) -> &'static str;

    fn params(&self) -> &'static [ParamSpec] {
        &[]
    }

    /// Extra load-time checks on literal parameter values.
    fn check(&self, _params: &Params, _scope: &CheckScope<'_>) -> Result<(), String> {
        Ok(())
    }

    async fn evaluate(&self, ctx: &BookingContext, params: &Params) -> Result<bool, ConditionError>;
}

/// A side-effecting operation over a booking context.
///
/// On success returns a detail value summarising the side effect.
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    fn params(&self) -> &'static [ParamSpec] {
        &[]
    }

    fn check(&self, _params: &Params, _scope: &CheckScope<'_>) -> Result<(), String> {
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &mut BookingContext,
        params: &Params,
        env: &ActionEnv<'_>,
    ) -> Result<Value, ActionError>;
}

/// Condition type name → implementation.
#[derive(Default, Clone)]
pub struct ConditionRegistry {
    entries: BTreeMap<&'static str, Arc<dyn Condition>>,
}

impl ConditionRegistry {
    /// Create a registry without any conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in condition registered.
    pub fn builtins() -> Self {
        let mut registry = Self::new();
        for condition in crate::conditions::builtins() {
            registry.register(condition);
        }
        registry
    }

    /// Register a condition, replacing any existing one with the same name.
    pub fn register(&mut self, condition: Arc<dyn Condition>) {
        self.entries.insert(condition.name(), condition);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Condition>> {
        self.entries.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    /// Evaluate a registered condition. Unknown names evaluate to an error.
    pub async fn evaluate(
        &self,
        name: &str,
        ctx: &BookingContext,
        params: &Params,
    ) -> Result<bool, ConditionError> {
        match self.get(name) {
            Some(condition) => condition.evaluate(ctx, params).await,
            None => Err(ConditionError::Unknown(name.to_string())),
        }
    }
}

/// Action type name → implementation.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    entries: BTreeMap<&'static str, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtins() -> Self {
        let mut registry = Self::new();
        for action in crate::actions::builtins() {
            registry.register(action);
        }
        registry
    }

    pub fn register(&mut self, action: Arc<dyn Action>) {
        self.entries.insert(action.name(), action);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Action>> {
        self.entries.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub async fn execute(
        &self,
        name: &str,
        ctx: &mut BookingContext,
        params: &Params,
        env: &ActionEnv<'_>,
    ) -> Result<Value, ActionError> {
        match self.get(name) {
            Some(action) => action.execute(ctx, params, env).await,
            None => Err(ActionError::Unknown(name.to_string())),
        }
    }
}
