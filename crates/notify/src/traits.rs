//! Sender trait definition and shared error types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur while preparing or delivering a message.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The gateway answered but refused the message.
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// The gateway could not be reached.
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("No sender registered for channel '{0}'")]
    NoSender(Channel),
}

/// Outbound channels a message can be dispatched through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Sms,
    Chat,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Sms, Channel::Chat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Sms => "sms",
            Channel::Chat => "chat",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub channel: Channel,
    /// Phone number for SMS, room or webhook key for chat.
    pub target: String,
    pub body: String,
    /// Extra context for logs (template name, booking id, ...).
    pub metadata: BTreeMap<String, String>,
}

/// Acknowledgement that a gateway accepted a message. Acceptance is not a
/// delivery confirmation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SendReceipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Trait for outbound channel implementations.
#[async_trait::async_trait]
pub trait MessageSender: Send + Sync {
    /// Hand a message to the gateway.
    async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, NotifyError>;

    /// Human-readable name for this sender (e.g., "sms-gateway", "dry-run").
    fn channel_name(&self) -> &str;
}
