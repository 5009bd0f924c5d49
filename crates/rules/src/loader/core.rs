//! [`RuleStore`] and the validated [`RuleSet`] it hands to the engine.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{error, info, warn};

use crate::registry::{ActionRegistry, ConditionRegistry};
use crate::schema::{Rule, RuleDocument, StoreProfile, TemplateCatalog};
use crate::validation::validate_document;

use super::error::{Result, RuleError};

/// A validated, ordered rule set. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// In source order. Evaluation order is this order.
    pub rules: Vec<Rule>,
    pub templates: TemplateCatalog,
    pub stores: BTreeMap<String, StoreProfile>,
}

impl RuleSet {
    /// Parse and validate a YAML source. Warnings are logged; any error
    /// rejects the whole source.
    pub fn parse(
        raw: &str,
        conditions: &ConditionRegistry,
        actions: &ActionRegistry,
    ) -> Result<Self> {
        let doc = RuleDocument::from_yaml(raw)?;
        Self::from_document(doc, conditions, actions)
    }

    pub fn from_document(
        doc: RuleDocument,
        conditions: &ConditionRegistry,
        actions: &ActionRegistry,
    ) -> Result<Self> {
        let result = validate_document(&doc, conditions, actions);
        for warning in &result.warnings {
            warn!(path = %warning.path, "{}", warning.message);
        }
        if !result.is_valid() {
            for e in &result.errors {
                error!(path = %e.path, suggestion = ?e.suggestion, "{}", e.message);
            }
            return Err(RuleError::Invalid {
                errors: result.errors,
            });
        }

        Ok(Self {
            rules: doc.rules,
            templates: doc.templates,
            stores: doc.stores,
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.rules.iter().filter(|r| r.enabled).count()
    }

    pub fn store(&self, store_id: &str) -> Option<&StoreProfile> {
        self.stores.get(store_id)
    }
}

/// File-backed holder of the active [`RuleSet`].
///
/// The registries are fixed at construction; reloading re-reads the file and
/// validates against the same registries.
pub struct RuleStore {
    source: Option<PathBuf>,
    conditions: ConditionRegistry,
    actions: ActionRegistry,
    current: RwLock<Arc<RuleSet>>,
}

impl RuleStore {
    /// Load and validate the rule file at `path`.
    pub fn open(
        path: impl Into<PathBuf>,
        conditions: &ConditionRegistry,
        actions: &ActionRegistry,
    ) -> Result<Self> {
        let path = path.into();
        let set = Self::read(&path, conditions, actions)?;
        info!(
            path = %path.display(),
            rules = set.len(),
            enabled = set.enabled_count(),
            templates = set.templates.len(),
            "loaded rule set"
        );
        Ok(Self {
            source: Some(path),
            conditions: conditions.clone(),
            actions: actions.clone(),
            current: RwLock::new(Arc::new(set)),
        })
    }

    /// Build a store from an in-memory source. It cannot be reloaded.
    pub fn from_yaml(
        raw: &str,
        conditions: &ConditionRegistry,
        actions: &ActionRegistry,
    ) -> Result<Self> {
        let set = RuleSet::parse(raw, conditions, actions)?;
        Ok(Self {
            source: None,
            conditions: conditions.clone(),
            actions: actions.clone(),
            current: RwLock::new(Arc::new(set)),
        })
    }

    fn read(
        path: &Path,
        conditions: &ConditionRegistry,
        actions: &ActionRegistry,
    ) -> Result<RuleSet> {
        let raw = fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        RuleSet::parse(&raw, conditions, actions)
    }

    /// The active rule set.
    pub fn current(&self) -> Arc<RuleSet> {
        Arc::clone(&self.current.read().expect("rule set lock poisoned"))
    }

    /// Re-read the source file. On any error the previous set stays active
    /// and the error is returned.
    pub fn reload(&self) -> Result<Arc<RuleSet>> {
        let path = self.source.as_deref().ok_or(RuleError::NoSource)?;
        match Self::read(path, &self.conditions, &self.actions) {
            Ok(set) => {
                let set = Arc::new(set);
                *self.current.write().expect("rule set lock poisoned") = Arc::clone(&set);
                info!(path = %path.display(), rules = set.len(), "reloaded rule set");
                Ok(set)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "rule reload rejected, keeping previous rule set");
                Err(e)
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn conditions(&self) -> &ConditionRegistry {
        &self.conditions
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }
}

impl std::fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleStore")
            .field("source", &self.source)
            .field("rules", &self.current().len())
            .finish()
    }
}
