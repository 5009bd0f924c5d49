//! Per-action results and their aggregation over a cycle.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use bookwatch_core::BookingId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of executing one action once. `error` is present iff `success`
/// is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub rule_name: String,
    pub action_type: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Value,
}

impl ActionResult {
    pub fn succeeded(rule_name: &str, action_type: &str, detail: Value) -> Self {
        Self {
            rule_name: rule_name.to_string(),
            action_type: action_type.to_string(),
            success: true,
            error: None,
            detail,
        }
    }

    pub fn failed(rule_name: &str, action_type: &str, error: impl fmt::Display) -> Self {
        Self {
            rule_name: rule_name.to_string(),
            action_type: action_type.to_string(),
            success: false,
            error: Some(error.to_string()),
            detail: Value::Null,
        }
    }
}

/// Every result produced for one booking, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub booking: BookingId,
    pub results: Vec<ActionResult>,
}

impl RecordOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &ActionResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Distinct rules that produced at least one result, in firing order.
    pub fn fired_rules(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for result in &self.results {
            if !names.contains(&result.rule_name.as_str()) {
                names.push(&result.rule_name);
            }
        }
        names
    }
}

/// Counts for one rule across a cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleTally {
    /// Bookings the rule produced results for.
    pub bookings: usize,
    pub actions: usize,
    pub failures: usize,
}

/// Aggregate of one cycle, suitable for an operations summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleSummary {
    pub records: usize,
    pub records_with_actions: usize,
    pub actions: usize,
    pub failures: usize,
    pub rules: BTreeMap<String, RuleTally>,
}

impl CycleSummary {
    pub fn from_outcomes(outcomes: &[RecordOutcome]) -> Self {
        let mut summary = Self {
            records: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            if !outcome.results.is_empty() {
                summary.records_with_actions += 1;
            }
            for name in outcome.fired_rules() {
                summary.rules.entry(name.to_string()).or_default().bookings += 1;
            }
            for result in &outcome.results {
                let tally = summary.rules.entry(result.rule_name.clone()).or_default();
                tally.actions += 1;
                summary.actions += 1;
                if !result.success {
                    tally.failures += 1;
                    summary.failures += 1;
                }
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failures > 0
    }

    /// Short plain-text report, one line per rule.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{} booking(s), {} with actions, {} action(s), {} failed",
            self.records, self.records_with_actions, self.actions, self.failures
        );
        for (name, tally) in &self.rules {
            let _ = write!(
                out,
                "\n- {name}: {} booking(s), {} action(s)",
                tally.bookings, tally.actions
            );
            if tally.failures > 0 {
                let _ = write!(out, ", {} failed", tally.failures);
            }
        }
        out
    }
}
