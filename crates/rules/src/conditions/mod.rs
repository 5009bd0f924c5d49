//! Built-in conditions.
//!
//! Every condition is a read: flags come from the context, record existence
//! from the repository. None of them write.

mod booking;
mod flags;
mod time;

use std::sync::Arc;

use crate::registry::Condition;

pub use booking::{KeywordPresent, StatusEquals, StatusIn, StoreIn};
pub use flags::{FlagIsSet, FlagNotSet, RecordIsNew};
pub use time::{DateInRange, HourEquals, WithinTimeWindow};

/// All built-in conditions, in registration order.
pub fn builtins() -> Vec<Arc<dyn Condition>> {
    vec![
        Arc::new(RecordIsNew),
        Arc::new(FlagNotSet),
        Arc::new(FlagIsSet),
        Arc::new(WithinTimeWindow),
        Arc::new(HourEquals),
        Arc::new(DateInRange),
        Arc::new(StatusEquals),
        Arc::new(StatusIn),
        Arc::new(KeywordPresent),
        Arc::new(StoreIn),
    ]
}
