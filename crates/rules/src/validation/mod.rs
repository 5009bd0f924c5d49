//! Rule document validation with structured errors and suggestions.
//!
//! Checks every rule (enabled or not) against the condition and action
//! registries, and every message template for syntax. Returns a
//! [`ValidationResult`] with errors (reject the document) and warnings
//! (advisory, logged by the loader).

mod rule_checks;
mod template_checks;

pub mod fuzzy;

use std::fmt;

use bookwatch_notify::TemplateRenderer;
use serde::{Deserialize, Serialize};

use crate::registry::{ActionRegistry, ConditionRegistry};
use crate::schema::RuleDocument;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Location in the document, e.g. `rules[2].actions[0].type`.
    pub path: String,
    pub message: String,
    /// Optional "did you mean" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{suggestion}'?)")?;
        }
        Ok(())
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<&str>,
    ) {
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: suggestion.map(str::to_string),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a parsed document against the given registries.
pub fn validate_document(
    doc: &RuleDocument,
    conditions: &ConditionRegistry,
    actions: &ActionRegistry,
) -> ValidationResult {
    let renderer = TemplateRenderer::new();
    let mut result = ValidationResult::new();
    rule_checks::validate_names(doc, &mut result);
    rule_checks::validate_specs(doc, conditions, actions, &renderer, &mut result);
    template_checks::validate_templates(doc, &renderer, &mut result);
    result
}
