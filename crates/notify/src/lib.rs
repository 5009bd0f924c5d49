//! Outbound message delivery for booking notifications.
//!
//! This crate provides:
//! - `MessageSender` trait, one implementation per channel (SMS, chat webhook)
//! - Minijinja template rendering for message bodies
//! - Dispatcher that routes a message to the sender registered for its channel
//! - Dry-run and recording senders for replays and tests

pub mod dispatcher;
pub mod senders;
pub mod templating;
pub mod traits;

pub use dispatcher::Dispatcher;
pub use senders::{LogSender, RecordingSender};
pub use templating::TemplateRenderer;
pub use traits::{Channel, MessageSender, NotifyError, OutboundMessage, SendReceipt};
