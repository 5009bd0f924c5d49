//! In-memory record of why rules did or did not fire.
//!
//! Entries are grouped per rule and capped (default 500 per rule, oldest
//! evicted first). Every entry carries a process-wide sequence number so a
//! booking's trail can be rebuilt across rules in the order it happened.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of an entry. Variants are ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Step of rule processing that produced the entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    /// A condition evaluated to false.
    Condition,
    /// A condition failed and was treated as false.
    ConditionError,
    /// Every condition held.
    Match,
    Action,
    ActionError,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub rule_name: String,
    /// `store/booking` identity the entry is about.
    pub booking: String,
    pub level: LogLevel,
    pub phase: ExecutionPhase,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Filters for [`AuditLog::query`].
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LogQueryParams {
    /// Minimum level, inclusive.
    pub level: Option<LogLevel>,
    pub phase: Option<ExecutionPhase>,
    pub booking: Option<String>,
    /// Defaults to 100.
    pub limit: Option<usize>,
    pub since: Option<DateTime<Utc>>,
}

impl LogQueryParams {
    fn accepts(&self, entry: &LogEntry) -> bool {
        self.level.map_or(true, |min| entry.level >= min)
            && self.phase.map_or(true, |p| entry.phase == p)
            && self.booking.as_deref().map_or(true, |b| entry.booking == b)
            && self.since.map_or(true, |s| entry.timestamp >= s)
    }
}

pub struct AuditLog {
    rules: RwLock<HashMap<String, VecDeque<LogEntry>>>,
    next_seq: AtomicU64,
    cap: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_max_entries(500)
    }

    /// A log keeping at most `max` entries per rule (at least one).
    pub fn with_max_entries(max: usize) -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            cap: max.max(1),
        }
    }

    pub fn log(
        &self,
        rule_name: &str,
        booking: &str,
        level: LogLevel,
        phase: ExecutionPhase,
        message: impl Into<String>,
    ) {
        self.log_with_details(rule_name, booking, level, phase, message, None);
    }

    pub fn log_with_details(
        &self,
        rule_name: &str,
        booking: &str,
        level: LogLevel,
        phase: ExecutionPhase,
        message: impl Into<String>,
        details: Option<Value>,
    ) {
        let entry = LogEntry {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            rule_name: rule_name.to_string(),
            booking: booking.to_string(),
            level,
            phase,
            message: message.into(),
            details,
        };

        let mut rules = self.rules.write().expect("audit log lock poisoned");
        let entries = rules.entry(entry.rule_name.clone()).or_default();
        entries.push_back(entry);
        if entries.len() > self.cap {
            entries.pop_front();
        }
    }

    /// Entries of one rule matching `params`, newest first.
    pub fn query(&self, rule_name: &str, params: &LogQueryParams) -> Vec<LogEntry> {
        let rules = self.rules.read().expect("audit log lock poisoned");
        rules
            .get(rule_name)
            .map(|entries| {
                entries
                    .iter()
                    .rev()
                    .filter(|e| params.accepts(e))
                    .take(params.limit.unwrap_or(100))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every retained entry about one booking, across all rules, in the
    /// order they were written.
    pub fn trail(&self, booking: &str) -> Vec<LogEntry> {
        let rules = self.rules.read().expect("audit log lock poisoned");
        let mut trail: Vec<LogEntry> = rules
            .values()
            .flatten()
            .filter(|e| e.booking == booking)
            .cloned()
            .collect();
        trail.sort_by_key(|e| e.seq);
        trail
    }

    /// Rules with at least one entry, sorted by name.
    pub fn rule_names(&self) -> Vec<String> {
        let rules = self.rules.read().expect("audit log lock poisoned");
        let mut names: Vec<String> = rules.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn clear(&self, rule_name: &str) {
        self.rules
            .write()
            .expect("audit log lock poisoned")
            .remove(rule_name);
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("cap", &self.cap)
            .field("rules", &self.rule_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const B1: &str = "store-01/b-1";
    const B2: &str = "store-01/b-2";

    fn all() -> LogQueryParams {
        LogQueryParams::default()
    }

    #[test]
    fn query_returns_newest_first() {
        let log = AuditLog::new();
        log.log("reminder", B1, LogLevel::Debug, ExecutionPhase::Condition, "window closed");
        log.log("reminder", B1, LogLevel::Info, ExecutionPhase::Match, "matched");
        log.log("reminder", B1, LogLevel::Error, ExecutionPhase::ActionError, "gateway down");

        let phases: Vec<_> = log.query("reminder", &all()).iter().map(|e| e.phase).collect();
        assert_eq!(
            phases,
            vec![
                ExecutionPhase::ActionError,
                ExecutionPhase::Match,
                ExecutionPhase::Condition
            ]
        );
    }

    #[test]
    fn level_is_a_minimum() {
        let log = AuditLog::new();
        log.log("r1", B1, LogLevel::Debug, ExecutionPhase::Condition, "false");
        log.log("r1", B1, LogLevel::Warning, ExecutionPhase::ConditionError, "repo down");
        log.log("r1", B1, LogLevel::Error, ExecutionPhase::ActionError, "rejected");

        let params = LogQueryParams {
            level: Some(LogLevel::Warning),
            ..all()
        };
        assert_eq!(log.query("r1", &params).len(), 2);
        assert!(LogLevel::Debug < LogLevel::Error);
    }

    #[test]
    fn booking_phase_and_limit_filters() {
        let log = AuditLog::new();
        for i in 0..5 {
            log.log("r1", B1, LogLevel::Info, ExecutionPhase::Match, format!("b1 {i}"));
            log.log("r1", B2, LogLevel::Info, ExecutionPhase::Action, format!("b2 {i}"));
        }

        let params = LogQueryParams {
            booking: Some(B2.to_string()),
            phase: Some(ExecutionPhase::Action),
            limit: Some(3),
            ..all()
        };
        let entries = log.query("r1", &params);
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.booking == B2));
        assert_eq!(entries[0].message, "b2 4");
    }

    #[test]
    fn since_skips_older_entries() {
        let log = AuditLog::new();
        log.log("r1", B1, LogLevel::Info, ExecutionPhase::Match, "old");

        let params = LogQueryParams {
            since: Some(Utc::now() + chrono::Duration::hours(1)),
            ..all()
        };
        assert!(log.query("r1", &params).is_empty());
    }

    #[test]
    fn oldest_entries_are_evicted_per_rule() {
        let log = AuditLog::with_max_entries(3);
        for i in 1..=4 {
            log.log("r1", B1, LogLevel::Info, ExecutionPhase::Match, format!("msg {i}"));
        }
        log.log("r2", B1, LogLevel::Info, ExecutionPhase::Match, "other rule");

        let entries = log.query("r1", &all());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "msg 4");
        assert_eq!(entries[2].message, "msg 2");
        assert_eq!(log.query("r2", &all()).len(), 1);
    }

    #[test]
    fn trail_interleaves_rules_in_write_order() {
        let log = AuditLog::new();
        log.log("new-booking", B1, LogLevel::Info, ExecutionPhase::Match, "matched");
        log.log("reminder", B1, LogLevel::Debug, ExecutionPhase::Condition, "false");
        log.log("new-booking", B2, LogLevel::Info, ExecutionPhase::Match, "matched");
        log.log_with_details(
            "new-booking",
            B1,
            LogLevel::Info,
            ExecutionPhase::Action,
            "set-flag",
            Some(serde_json::json!({ "flag": "confirmation-sent" })),
        );

        let trail = log.trail(B1);
        let rules: Vec<_> = trail.iter().map(|e| e.rule_name.as_str()).collect();
        assert_eq!(rules, vec!["new-booking", "reminder", "new-booking"]);
        assert_eq!(trail[2].details.as_ref().unwrap()["flag"], "confirmation-sent");
    }

    #[test]
    fn clear_forgets_one_rule() {
        let log = AuditLog::new();
        log.log("r1", B1, LogLevel::Info, ExecutionPhase::Match, "r1");
        log.log("r2", B1, LogLevel::Error, ExecutionPhase::ActionError, "r2");
        assert_eq!(log.rule_names(), vec!["r1", "r2"]);

        log.clear("r1");
        assert!(log.query("r1", &all()).is_empty());
        assert_eq!(log.rule_names(), vec!["r2"]);
        assert!(log.query("missing", &all()).is_empty());
    }
}
