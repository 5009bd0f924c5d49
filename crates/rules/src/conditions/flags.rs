//! Idempotency gates: record existence and flag state.

use async_trait::async_trait;

use crate::context::BookingContext;
use crate::error::ConditionError;
use crate::registry::{Condition, ParamKind, ParamSpec, Params};

const FLAG_PARAMS: &[ParamSpec] = &[ParamSpec::required("name", ParamKind::Str)];

/// True iff the repository holds no durable record for this booking yet.
pub struct RecordIsNew;

#[async_trait]
impl Condition for RecordIsNew {
    fn name(&self) -> &'static str {
        "record-is-new"
    }

    async fn evaluate(&self, ctx: &BookingContext, _params: &Params) -> Result<bool, ConditionError> {
        let existing = ctx.services.repository.get(ctx.identity()).await?;
        Ok(existing.is_none())
    }
}

/// True iff the named flag is false or absent.
pub struct FlagNotSet;

#[async_trait]
impl Condition for FlagNotSet {
    fn name(&self) -> &'static str {
        "flag-not-set"
    }

    fn params(&self) -> &'static [ParamSpec] {
        FLAG_PARAMS
    }

    async fn evaluate(&self, ctx: &BookingContext, params: &Params) -> Result<bool, ConditionError> {
        Ok(!ctx.flags.is_set(params.str("name")?))
    }
}

/// True iff the named flag is true.
pub struct FlagIsSet;

#[async_trait]
impl Condition for FlagIsSet {
    fn name(&self) -> &'static str {
        "flag-set"
    }

    fn params(&self) -> &'static [ParamSpec] {
        FLAG_PARAMS
    }

    async fn evaluate(&self, ctx: &BookingContext, params: &Params) -> Result<bool, ConditionError> {
        Ok(ctx.flags.is_set(params.str("name")?))
    }
}
