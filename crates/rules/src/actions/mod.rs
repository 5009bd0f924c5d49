//! Built-in actions.
//!
//! Actions return `Err` for any collaborator failure; the engine turns that
//! into a failed [`ActionResult`](crate::ActionResult) and moves on.

mod log;
mod message;
mod record;

use std::sync::Arc;

use crate::registry::Action;

pub use log::EmitLogEvent;
pub use message::SendMessage;
pub use record::{CreateRecord, SetFlag};

pub fn builtins() -> Vec<Arc<dyn Action>> {
    vec![
        Arc::new(CreateRecord),
        Arc::new(SetFlag),
        Arc::new(SendMessage),
        Arc::new(EmitLogEvent),
    ]
}
