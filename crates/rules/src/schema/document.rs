//! Top-level rule document: rules plus the message templates and store
//! profiles they refer to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Rule;

/// Message templates keyed by name.
pub type TemplateCatalog = BTreeMap<String, MessageTemplate>;

/// Everything a rule source can declare.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub templates: TemplateCatalog,
    #[serde(default)]
    pub stores: BTreeMap<String, StoreProfile>,
}

impl RuleDocument {
    /// Parse YAML (or JSON) holding either a document or a bare rule list.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        let value: serde_yaml::Value = serde_yaml::from_str(raw)?;
        if value.is_sequence() {
            let rules: Vec<Rule> = serde_yaml::from_value(value)?;
            return Ok(Self {
                rules,
                ..Self::default()
            });
        }
        serde_yaml::from_value(value)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// A message body with optional per-store overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub body: String,
    /// Store id → body used instead of the default for that store.
    #[serde(default)]
    pub stores: BTreeMap<String, String>,
}

impl MessageTemplate {
    pub fn body_for(&self, store_id: &str) -> &str {
        self.stores
            .get(store_id)
            .map(String::as_str)
            .unwrap_or(&self.body)
    }

    /// Default body first, then overrides in store order.
    pub fn bodies(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        std::iter::once((None, self.body.as_str()))
            .chain(self.stores.iter().map(|(k, v)| (Some(k.as_str()), v.as_str())))
    }
}

/// Store-specific metadata exposed to templates as `store.*`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreProfile {
    #[serde(default)]
    pub name: String,
    /// Chat room or webhook key that `target: store` resolves to.
    #[serde(default)]
    pub chat_target: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
