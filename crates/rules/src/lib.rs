//! Declarative rule engine for booking notifications.
//!
//! This crate provides:
//! - YAML rule sources with message templates and store profiles
//! - A validating Rule Store with "did you mean" suggestions and safe reload
//! - Condition and action registries with the built-in implementations
//! - Parameter references (`${path}`) and minijinja rendering against a booking
//! - The orchestrator that turns one booking into an ordered result list

pub mod actions;
pub mod audit_log;
pub mod conditions;
pub mod context;
pub mod engine;
pub mod error;
pub mod loader;
pub mod registry;
pub mod render;
pub mod result;
pub mod schema;
pub mod validation;

pub use context::{BookingContext, Services};
pub use engine::RuleEngine;
pub use error::{ActionError, ConditionError, ParamError, RenderError};
pub use loader::{RuleError, RuleSet, RuleStore};
pub use registry::{Action, ActionRegistry, Condition, ConditionRegistry, Params};
pub use result::{ActionResult, CycleSummary, RecordOutcome};
