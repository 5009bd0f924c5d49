//! Errors raised while evaluating rules against one booking.
//!
//! None of these abort a cycle: condition errors make the condition false and
//! action errors end up in that action's [`ActionResult`](crate::ActionResult).
//! Load-time errors live in [`crate::loader::RuleError`].

use bookwatch_core::RepositoryError;
use bookwatch_notify::NotifyError;
use thiserror::Error;

use crate::registry::ParamKind;

/// A parameter was missing or had the wrong shape after rendering.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("missing parameter '{0}'")]
    Missing(String),

    #[error("parameter '{name}' must be {expected}")]
    Shape { name: String, expected: &'static str },

    #[error("parameter '{name}' is out of range: {reason}")]
    OutOfRange { name: String, reason: String },
}

impl ParamError {
    pub(crate) fn shape(name: &str, kind: ParamKind) -> Self {
        ParamError::Shape {
            name: name.to_string(),
            expected: kind.describe(),
        }
    }
}

/// A parameter reference could not be resolved against the booking.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unresolved reference '${{{0}}}'")]
    Unresolved(String),

    #[error("template error: {0}")]
    Template(String),
}

#[derive(Debug, Error)]
pub enum ConditionError {
    #[error("unknown condition type '{0}'")]
    Unknown(String),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("repository read failed: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unknown action type '{0}'")]
    Unknown(String),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("repository write failed: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("no message target: {0}")]
    MissingTarget(String),

    #[error("unknown message template '{0}'")]
    UnknownTemplate(String),

    #[error("flag '{0}' is already set and cannot be cleared")]
    FlagRegression(String),
}
