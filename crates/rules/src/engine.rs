//! Engine orchestrator: runs the active rule set against one booking.
//!
//! For each enabled rule in source order, conditions are evaluated with AND
//! (short-circuiting on the first false). When all hold, the rule's actions
//! run in order and each produces one [`ActionResult`]. A failing action
//! never stops the remaining actions or rules; a failing condition counts
//! as false.

use std::sync::Arc;

use bookwatch_notify::TemplateRenderer;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::audit_log::{AuditLog, ExecutionPhase, LogLevel};
use crate::context::BookingContext;
use crate::loader::{Result, RuleSet};
use crate::registry::{ActionEnv, ActionRegistry, ConditionRegistry, Params};
use crate::render::ParameterRenderer;
use crate::result::{ActionResult, RecordOutcome};
use crate::schema::{ActionSpec, ConditionSpec, Rule, StoreProfile};

pub struct RuleEngine {
    rules: Arc<RuleSet>,
    conditions: ConditionRegistry,
    actions: ActionRegistry,
    params: ParameterRenderer,
    templates: TemplateRenderer,
    audit: Option<Arc<AuditLog>>,
}

impl RuleEngine {
    /// `rules` must have been validated against these registries.
    pub fn new(rules: Arc<RuleSet>, conditions: ConditionRegistry, actions: ActionRegistry) -> Self {
        Self {
            rules,
            conditions,
            actions,
            params: ParameterRenderer::new(),
            templates: TemplateRenderer::new(),
            audit: None,
        }
    }

    /// Parse and validate a source against the built-in registries.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let conditions = ConditionRegistry::builtins();
        let actions = ActionRegistry::builtins();
        let rules = RuleSet::parse(raw, &conditions, &actions)?;
        Ok(Self::new(Arc::new(rules), conditions, actions))
    }

    pub fn with_audit_log(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    /// Run every enabled rule against `ctx` and return the results of every
    /// executed action, in execution order.
    pub async fn process(&self, ctx: &mut BookingContext) -> Vec<ActionResult> {
        let mut results = Vec::new();
        let store = self.rules.store(&ctx.booking.id.store_id);

        for rule in &self.rules.rules {
            if !rule.enabled {
                debug!(rule = %rule.name, "rule disabled, skipping");
                continue;
            }
            if !self.conditions_hold(rule, ctx, store).await {
                continue;
            }

            info!(rule = %rule.name, booking = %ctx.identity(), "rule matched");
            self.audit(rule, ctx, LogLevel::Info, ExecutionPhase::Match, "all conditions held", None);

            let env = ActionEnv {
                rule_name: &rule.name,
                templates: &self.rules.templates,
                store,
                renderer: &self.templates,
            };
            for spec in &rule.actions {
                let result = self.run_action(rule, spec, ctx, &env).await;
                results.push(result);
            }
        }

        results
    }

    /// Process contexts one after another. Flags written for one booking are
    /// never visible to another.
    pub async fn process_batch(
        &self,
        contexts: impl IntoIterator<Item = BookingContext>,
    ) -> Vec<RecordOutcome> {
        let mut outcomes = Vec::new();
        for mut ctx in contexts {
            let results = self.process(&mut ctx).await;
            outcomes.push(RecordOutcome {
                booking: ctx.booking.id,
                results,
            });
        }
        outcomes
    }

    async fn conditions_hold(
        &self,
        rule: &Rule,
        ctx: &BookingContext,
        store: Option<&StoreProfile>,
    ) -> bool {
        for spec in &rule.conditions {
            match self.evaluate(spec, ctx, store).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(rule = %rule.name, condition = %spec.kind, booking = %ctx.identity(), "condition false");
                    self.audit(rule, ctx, LogLevel::Debug, ExecutionPhase::Condition, format!("{} is false", spec.kind), None);
                    return false;
                }
                Err(message) => {
                    warn!(
                        rule = %rule.name,
                        condition = %spec.kind,
                        booking = %ctx.identity(),
                        error = %message,
                        "condition failed, treating as false"
                    );
                    self.audit(rule, ctx, LogLevel::Warning, ExecutionPhase::ConditionError, format!("{}: {message}", spec.kind), None);
                    return false;
                }
            }
        }
        true
    }

    async fn evaluate(
        &self,
        spec: &ConditionSpec,
        ctx: &BookingContext,
        store: Option<&StoreProfile>,
    ) -> std::result::Result<bool, String> {
        let params = self
            .render(&spec.parameters, ctx, store)
            .map_err(|e| e.to_string())?;
        self.conditions
            .evaluate(&spec.kind, ctx, &params)
            .await
            .map_err(|e| e.to_string())
    }

    async fn run_action(
        &self,
        rule: &Rule,
        spec: &ActionSpec,
        ctx: &mut BookingContext,
        env: &ActionEnv<'_>,
    ) -> ActionResult {
        let params = match self.render(&spec.parameters, ctx, env.store) {
            Ok(params) => params,
            Err(e) => return self.action_failed(rule, spec, ctx, e),
        };

        match self.actions.execute(&spec.kind, ctx, &params, env).await {
            Ok(detail) => {
                info!(rule = %rule.name, action = %spec.kind, booking = %ctx.identity(), "action succeeded");
                self.audit(rule, ctx, LogLevel::Info, ExecutionPhase::Action, spec.kind.clone(), Some(detail.clone()));
                ActionResult::succeeded(&rule.name, &spec.kind, detail)
            }
            Err(e) => self.action_failed(rule, spec, ctx, e),
        }
    }

    fn action_failed(
        &self,
        rule: &Rule,
        spec: &ActionSpec,
        ctx: &BookingContext,
        error: impl std::fmt::Display,
    ) -> ActionResult {
        warn!(
            rule = %rule.name,
            action = %spec.kind,
            booking = %ctx.identity(),
            error = %error,
            "action failed, continuing"
        );
        self.audit(rule, ctx, LogLevel::Error, ExecutionPhase::ActionError, format!("{}: {error}", spec.kind), None);
        ActionResult::failed(&rule.name, &spec.kind, error)
    }

    fn render(
        &self,
        params: &Params,
        ctx: &BookingContext,
        store: Option<&StoreProfile>,
    ) -> std::result::Result<Params, crate::error::RenderError> {
        if params.is_empty() {
            return Ok(Params::new());
        }
        self.params.render(params, &ctx.view(store))
    }

    fn audit(
        &self,
        rule: &Rule,
        ctx: &BookingContext,
        level: LogLevel,
        phase: ExecutionPhase,
        message: impl Into<String>,
        details: Option<Value>,
    ) {
        if let Some(audit) = &self.audit {
            audit.log_with_details(&rule.name, &ctx.identity().to_string(), level, phase, message, details);
        }
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rules.len())
            .field("conditions", &self.conditions.names())
            .field("actions", &self.actions.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bookwatch_core::{DurableRecord, MemoryRepository};

    use super::*;
    use crate::audit_log::LogQueryParams;
    use crate::conditions::testing::{booking_at, context_with};

    const AT: &str = "2026-03-01T13:30:00+09:00";
    const NOW: &str = "2026-03-01T12:00:00+09:00";

    #[tokio::test]
    async fn disabled_rules_and_empty_conditions() {
        let engine = RuleEngine::from_yaml(
            r#"
- name: always
  actions:
    - type: emit-log-event
      parameters: { event: seen }
- name: never
  enabled: false
  actions:
    - type: emit-log-event
      parameters: { event: hidden }
"#,
        )
        .unwrap();
        let mut ctx = context_with(booking_at(AT), NOW, Arc::new(MemoryRepository::new()));

        let results = engine.process(&mut ctx).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rule_name, "always");
        assert!(results[0].success);
    }

    #[tokio::test]
    async fn render_failure_fails_only_that_action() {
        let engine = RuleEngine::from_yaml(
            r#"
- name: greet
  actions:
    - type: emit-log-event
      parameters: { event: "${attributes.campaign}" }
    - type: emit-log-event
      parameters: { event: "hello {{ booking.customer_name }}" }
"#,
        )
        .unwrap();
        let mut ctx = context_with(booking_at(AT), NOW, Arc::new(MemoryRepository::new()));

        let results = engine.process(&mut ctx).await;
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[0].error.as_deref().unwrap().contains("attributes.campaign"));
        assert_eq!(results[1].detail["event"], "hello Sato");
    }

    #[tokio::test]
    async fn condition_render_failure_skips_rule() {
        let engine = RuleEngine::from_yaml(
            r#"
- name: vip
  conditions:
    - type: keyword-present
      parameters: { keywords: "${attributes.vip_keywords}" }
  actions:
    - type: emit-log-event
      parameters: { event: vip }
"#,
        )
        .unwrap();

        let mut ctx = context_with(booking_at(AT), NOW, Arc::new(MemoryRepository::new()));
        assert!(engine.process(&mut ctx).await.is_empty());

        let mut booking = booking_at(AT);
        booking
            .attributes
            .insert("vip_keywords".into(), serde_json::json!(["birthday"]));
        let mut ctx = context_with(booking, NOW, Arc::new(MemoryRepository::new()));
        assert_eq!(engine.process(&mut ctx).await.len(), 1);
    }

    #[tokio::test]
    async fn out_of_range_window_skips_only_its_rule() {
        let engine = RuleEngine::from_yaml(
            r#"
- name: reminder
  conditions:
    - type: within-time-window
      parameters: { hours: "${attributes.window}" }
  actions:
    - type: emit-log-event
      parameters: { event: reminder }
- name: after
  actions:
    - type: emit-log-event
      parameters: { event: after }
"#,
        )
        .unwrap();
        let mut booking = booking_at(AT);
        booking
            .attributes
            .insert("window".into(), serde_json::json!(-1e300));
        let mut ctx = context_with(booking, NOW, Arc::new(MemoryRepository::new()));

        let results = engine.process(&mut ctx).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rule_name, "after");
    }

    #[tokio::test]
    async fn audit_log_records_decisions() {
        let audit = Arc::new(AuditLog::new());
        let engine = RuleEngine::from_yaml(
            r#"
- name: new-booking
  conditions:
    - type: record-is-new
  actions:
    - type: create-record
"#,
        )
        .unwrap()
        .with_audit_log(Arc::clone(&audit));

        let booking = booking_at(AT);
        let existing = DurableRecord::new(booking.id.clone(), ctx_now());
        let repo = Arc::new(MemoryRepository::with_records([existing]));
        let mut ctx = context_with(booking, NOW, repo);
        assert!(engine.process(&mut ctx).await.is_empty());

        let entries = audit.query("new-booking", &LogQueryParams::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].phase, ExecutionPhase::Condition);
        assert_eq!(entries[0].booking, "store-01/b-100");
    }

    #[tokio::test]
    async fn batch_keeps_bookings_apart() {
        let engine = RuleEngine::from_yaml(
            r#"
- name: new-booking
  conditions:
    - type: record-is-new
  actions:
    - type: create-record
    - type: set-flag
      parameters: { name: confirmation-sent }
"#,
        )
        .unwrap();
        let repo = Arc::new(MemoryRepository::new());
        let mut second = booking_at(AT);
        second.id.booking_id = "b-101".into();

        let contexts = vec![
            context_with(booking_at(AT), NOW, Arc::clone(&repo)),
            context_with(second, NOW, Arc::clone(&repo)),
        ];
        let outcomes = engine.process_batch(contexts).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[1].booking.booking_id, "b-101");
        assert!(outcomes.iter().all(|o| o.results.len() == 2 && o.failures().count() == 0));
        assert_eq!(repo.snapshot().len(), 2);
    }

    fn ctx_now() -> chrono::DateTime<chrono::FixedOffset> {
        chrono::DateTime::parse_from_rfc3339(NOW).unwrap()
    }
}
