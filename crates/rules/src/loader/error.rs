//! Error type for loading a rule source.

use std::path::PathBuf;

use crate::validation::ValidationError;

/// A rule source that cannot be used. Always fatal for the load: no part of
/// a rejected source is ever evaluated.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("failed to read rule source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more rules reference unknown types or malformed parameters.
    #[error("invalid rule configuration ({} error(s)): {}", .errors.len(), summarize(.errors))]
    Invalid { errors: Vec<ValidationError> },

    #[error("no rule source path to reload from")]
    NoSource,
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl RuleError {
    /// Validation errors behind an [`RuleError::Invalid`], empty otherwise.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            RuleError::Invalid { errors } => errors,
            _ => &[],
        }
    }
}

/// Result alias for rule loading.
pub type Result<T> = std::result::Result<T, RuleError>;
