use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::context::BookingContext;
use crate::error::ActionError;
use crate::registry::{Action, ActionEnv, CheckScope, ParamKind, ParamSpec, Params};

/// Record a structured outcome in the log. No external side effect; never fails.
pub struct EmitLogEvent;

const LOG_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("event", ParamKind::Str),
    ParamSpec::optional("message", ParamKind::Str),
    ParamSpec::optional("level", ParamKind::Str),
];

const LEVELS: [&str; 3] = ["debug", "info", "warn"];

#[async_trait]
impl Action for EmitLogEvent {
    fn name(&self) -> &'static str {
        "emit-log-event"
    }

    fn params(&self) -> &'static [ParamSpec] {
        LOG_PARAMS
    }

    fn check(&self, params: &Params, _scope: &CheckScope<'_>) -> Result<(), String> {
        match params.get("level").and_then(|v| v.as_str()) {
            Some(level) if !LEVELS.contains(&level) => Err(format!(
                "level must be one of {}, got '{level}'",
                LEVELS.join(", ")
            )),
            _ => Ok(()),
        }
    }

    async fn execute(
        &self,
        ctx: &mut BookingContext,
        params: &Params,
        env: &ActionEnv<'_>,
    ) -> Result<Value, ActionError> {
        let event = params.str("event").unwrap_or("unnamed");
        let note = params.opt_str("message").ok().flatten().unwrap_or("");
        let booking = ctx.identity().to_string();

        match params.opt_str("level").ok().flatten() {
            Some("debug") => debug!(rule = env.rule_name, booking = %booking, event, note, "Rule event"),
            Some("warn") => warn!(rule = env.rule_name, booking = %booking, event, note, "Rule event"),
            _ => info!(rule = env.rule_name, booking = %booking, event, note, "Rule event"),
        }

        Ok(json!({ "event": event, "booking": booking }))
    }
}
