//! Time-based conditions. All comparisons use the context's frozen `now`.

use async_trait::async_trait;
use chrono::{Duration, Timelike};

use crate::context::BookingContext;
use crate::error::{ConditionError, ParamError};
use crate::registry::{CheckScope, Condition, ParamKind, ParamSpec, Params};
use crate::render::is_reference;

/// True iff `0 <= scheduled_at - now < hours`. Bookings in the past never match.
pub struct WithinTimeWindow;

const WINDOW_PARAMS: &[ParamSpec] = &[ParamSpec::required("hours", ParamKind::Number)];

#[async_trait]
impl Condition for WithinTimeWindow {
    fn name(&self) -> &'static str {
        "within-time-window"
    }

    fn params(&self) -> &'static [ParamSpec] {
        WINDOW_PARAMS
    }

    fn check(&self, params: &Params, _scope: &CheckScope<'_>) -> Result<(), String> {
        match params.get("hours").and_then(|v| v.as_f64()) {
            Some(hours) if hours <= 0.0 => Err(format!("hours must be positive, got {hours}")),
            _ => Ok(()),
        }
    }

    async fn evaluate(&self, ctx: &BookingContext, params: &Params) -> Result<bool, ConditionError> {
        let hours = params.number("hours")?;
        let window = window_from_hours(hours)?;
        let until = ctx.booking.scheduled_at.signed_duration_since(ctx.now);
        Ok(until >= Duration::zero() && until < window)
    }
}

/// Referenced values skip the load-time check, so the range is enforced here.
fn window_from_hours(hours: f64) -> Result<Duration, ParamError> {
    let out_of_range = |reason: String| ParamError::OutOfRange {
        name: "hours".to_string(),
        reason,
    };
    if !hours.is_finite() || hours <= 0.0 {
        return Err(out_of_range(format!("expected a positive number, got {hours}")));
    }
    let millis = (hours * 3_600_000.0).round();
    let too_long = || out_of_range(format!("{hours} hours does not fit a time window"));
    if millis >= i64::MAX as f64 {
        return Err(too_long());
    }
    Duration::try_milliseconds(millis as i64).ok_or_else(too_long)
}

/// True iff the hour of `now`, in now's own offset, equals `hour`.
pub struct HourEquals;

const HOUR_PARAMS: &[ParamSpec] = &[ParamSpec::required("hour", ParamKind::Integer)];

#[async_trait]
impl Condition for HourEquals {
    fn name(&self) -> &'static str {
        "hour-equals"
    }

    fn params(&self) -> &'static [ParamSpec] {
        HOUR_PARAMS
    }

    fn check(&self, params: &Params, _scope: &CheckScope<'_>) -> Result<(), String> {
        match params.get("hour").and_then(|v| v.as_i64()) {
            Some(hour) if !(0..=23).contains(&hour) => {
                Err(format!("hour must be between 0 and 23, got {hour}"))
            }
            _ => Ok(()),
        }
    }

    async fn evaluate(&self, ctx: &BookingContext, params: &Params) -> Result<bool, ConditionError> {
        let hour = params.integer("hour")?;
        Ok(i64::from(ctx.now.hour()) == hour)
    }
}

/// True iff the booking's scheduled date lies in `[start, end]`, inclusive.
pub struct DateInRange;

const RANGE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("start", ParamKind::Date),
    ParamSpec::required("end", ParamKind::Date),
];

#[async_trait]
impl Condition for DateInRange {
    fn name(&self) -> &'static str {
        "date-in-range"
    }

    fn params(&self) -> &'static [ParamSpec] {
        RANGE_PARAMS
    }

    fn check(&self, params: &Params, _scope: &CheckScope<'_>) -> Result<(), String> {
        let literal = |name: &str| params.get(name).is_some_and(|v| !is_reference(v));
        if !(literal("start") && literal("end")) {
            return Ok(());
        }
        match (params.date("start"), params.date("end")) {
            (Ok(start), Ok(end)) if start > end => {
                Err(format!("start {start} is after end {end}"))
            }
            _ => Ok(()),
        }
    }

    async fn evaluate(&self, ctx: &BookingContext, params: &Params) -> Result<bool, ConditionError> {
        let start = params.date("start")?;
        let end = params.date("end")?;
        let date = ctx.booking.scheduled_at.date_naive();
        Ok(start <= date && date <= end)
    }
}
