//! Rule, condition and action definitions.

use serde::{Deserialize, Serialize};

use crate::registry::Params;

/// A named, ordered pair of conditions and actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique, human-readable name. Reported in every action result.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Combined with AND. Empty means the rule always matches.
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
    /// Executed in order when every condition holds.
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

fn default_enabled() -> bool {
    true
}

/// Reference to a registered condition plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub parameters: Params,
}

/// Reference to a registered action plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub parameters: Params,
}

impl ConditionSpec {
    pub fn new(kind: impl Into<String>, parameters: Params) -> Self {
        Self { kind: kind.into(), parameters }
    }
}

impl ActionSpec {
    pub fn new(kind: impl Into<String>, parameters: Params) -> Self {
        Self { kind: kind.into(), parameters }
    }
}
