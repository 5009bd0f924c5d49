//! Repository writes: durable record creation and flag updates.

use async_trait::async_trait;
use bookwatch_core::DurableRecord;
use serde_json::{json, Value};

use crate::context::BookingContext;
use crate::error::ActionError;
use crate::registry::{Action, ActionEnv, ParamKind, ParamSpec, Params};

/// Persist the durable record for this booking.
///
/// Not idempotent on its own: a second call for the same identity fails with
/// `AlreadyExists`. Rules gate it with `record-is-new`.
pub struct CreateRecord;

#[async_trait]
impl Action for CreateRecord {
    fn name(&self) -> &'static str {
        "create-record"
    }

    async fn execute(
        &self,
        ctx: &mut BookingContext,
        _params: &Params,
        _env: &ActionEnv<'_>,
    ) -> Result<Value, ActionError> {
        let mut record = DurableRecord::new(ctx.identity().clone(), ctx.now);
        record.scheduled_at = Some(ctx.booking.scheduled_at);
        record.flags = ctx.flags.clone();

        ctx.services.repository.create(record).await?;
        Ok(json!({ "record": ctx.identity().to_string() }))
    }
}

/// Write a flag through the repository, then mirror it into the context.
pub struct SetFlag;

const SET_FLAG_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("name", ParamKind::Str),
    ParamSpec::optional("value", ParamKind::Bool),
];

#[async_trait]
impl Action for SetFlag {
    fn name(&self) -> &'static str {
        "set-flag"
    }

    fn params(&self) -> &'static [ParamSpec] {
        SET_FLAG_PARAMS
    }

    async fn execute(
        &self,
        ctx: &mut BookingContext,
        params: &Params,
        _env: &ActionEnv<'_>,
    ) -> Result<Value, ActionError> {
        let name = params.str("name")?;
        let value = params.bool_or("value", true)?;

        if !value && ctx.flags.is_set(name) {
            return Err(ActionError::FlagRegression(name.to_string()));
        }

        ctx.services
            .repository
            .update_flag(&ctx.booking.id, name, value)
            .await?;

        let changed = value && ctx.flags.mark(name);
        Ok(json!({ "flag": name, "value": value, "changed": changed }))
    }
}
