//! Senders that never leave the process: a dry-run sender that logs, and a
//! recording sender for tests and replays.

use std::sync::{Arc, Mutex};

use crate::traits::{MessageSender, NotifyError, OutboundMessage, SendReceipt};

/// Accepts every message and only logs it.
#[derive(Debug, Default)]
pub struct LogSender;

#[async_trait::async_trait]
impl MessageSender for LogSender {
    async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, NotifyError> {
        tracing::info!(
            channel = %message.channel,
            target = %bookwatch_core::mask_phone(&message.target),
            metadata = ?message.metadata,
            body = %message.body,
            "dry-run message"
        );
        Ok(SendReceipt::default())
    }

    fn channel_name(&self) -> &str {
        "dry-run"
    }
}

/// Keeps every accepted message in memory. Can be told to reject everything.
#[derive(Debug)]
pub struct RecordingSender {
    name: String,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    failure: Option<String>,
}

impl RecordingSender {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sent: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// A sender whose every `send` fails with a transport error.
    pub fn failing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new(name)
        }
    }

    /// Messages accepted so far, in send order.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().expect("sent lock poisoned").clone()
    }
}

#[async_trait::async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, NotifyError> {
        if let Some(reason) = &self.failure {
            return Err(NotifyError::Transport(reason.clone()));
        }
        let mut sent = self.sent.lock().expect("sent lock poisoned");
        sent.push(message.clone());
        Ok(SendReceipt {
            message_id: Some(format!("{}-{}", self.name, sent.len())),
        })
    }

    fn channel_name(&self) -> &str {
        &self.name
    }
}
