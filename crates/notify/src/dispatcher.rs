//! Routes messages to the sender registered for their channel.
//!
//! One sender per channel. A missing sender is reported as an error for that
//! message only; nothing here retries.

use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::{Channel, MessageSender, NotifyError, OutboundMessage, SendReceipt};

/// Channel → sender routing table.
#[derive(Default)]
pub struct Dispatcher {
    senders: HashMap<Channel, Arc<dyn MessageSender>>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every channel to the same sender (dry runs).
    pub fn with_default(sender: Arc<dyn MessageSender>) -> Self {
        let mut dispatcher = Self::new();
        for channel in Channel::ALL {
            dispatcher.register(channel, Arc::clone(&sender));
        }
        dispatcher
    }

    /// Register or replace the sender for a channel.
    pub fn register(&mut self, channel: Channel, sender: Arc<dyn MessageSender>) {
        self.senders.insert(channel, sender);
    }

    /// Hand a message to its channel's sender.
    pub async fn dispatch(&self, message: &OutboundMessage) -> Result<SendReceipt, NotifyError> {
        let sender = self
            .senders
            .get(&message.channel)
            .ok_or(NotifyError::NoSender(message.channel))?;

        let start = std::time::Instant::now();
        let result = sender.send(message).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::info!(
                channel = %message.channel,
                sender = sender.channel_name(),
                duration_ms,
                "Message accepted"
            ),
            Err(e) => tracing::warn!(
                channel = %message.channel,
                sender = sender.channel_name(),
                error = %e,
                duration_ms,
                "Message delivery failed"
            ),
        }

        result
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut channels: Vec<_> = self.senders.keys().collect();
        channels.sort();
        f.debug_struct("Dispatcher").field("channels", &channels).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::senders::RecordingSender;
    use std::collections::BTreeMap;

    fn message(channel: Channel) -> OutboundMessage {
        OutboundMessage {
            channel,
            target: "09012345678".to_string(),
            body: "test body".to_string(),
            metadata: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn dispatch_routes_by_channel() {
        let sms = Arc::new(RecordingSender::new("sms"));
        let chat = Arc::new(RecordingSender::new("chat"));

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Channel::Sms, sms.clone());
        dispatcher.register(Channel::Chat, chat.clone());

        dispatcher.dispatch(&message(Channel::Chat)).await.unwrap();

        assert_eq!(sms.sent().len(), 0);
        assert_eq!(chat.sent().len(), 1);
    }

    #[tokio::test]
    async fn missing_channel_is_an_error() {
        let dispatcher = Dispatcher::new();
        let err = dispatcher.dispatch(&message(Channel::Sms)).await.unwrap_err();
        assert!(matches!(err, NotifyError::NoSender(Channel::Sms)));
    }

    #[tokio::test]
    async fn sender_failure_is_returned() {
        let sms = Arc::new(RecordingSender::failing("sms", "gateway down"));
        let dispatcher = Dispatcher::with_default(sms.clone());

        let err = dispatcher.dispatch(&message(Channel::Sms)).await.unwrap_err();
        assert!(err.to_string().contains("gateway down"));
        assert_eq!(sms.sent().len(), 0);
    }
}
