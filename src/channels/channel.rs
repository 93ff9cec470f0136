//! Channel trait and the message types that cross it.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::error::ChannelError;
use crate::funnel::QuickReplies;

/// Stream of inbound messages produced by a channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A text message received from a transport.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Name of the channel that produced the message.
    pub channel: String,
    /// Transport-specific sender id.
    pub user_id: String,
    /// Human-readable sender name, if the transport knows one.
    pub user_name: Option<String>,
    pub content: String,
    pub received_at: DateTime<Utc>,
    /// Channel-specific routing data (Telegram stores `chat_id` here).
    pub metadata: serde_json::Value,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            user_name: None,
            content: content.to_string(),
            received_at: Utc::now(),
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_user_name(mut self, name: &str) -> Self {
        self.user_name = Some(name.to_string());
        self
    }

    /// Chat id from metadata, if the channel provided one.
    pub fn chat_id(&self) -> Option<&str> {
        self.metadata.get("chat_id").and_then(|v| v.as_str())
    }

    /// Key of the conversation this message belongs to: one per channel,
    /// chat and user.
    pub fn session_key(&self) -> String {
        match self.chat_id() {
            Some(chat_id) => format!("{}:{}:{}", self.channel, chat_id, self.user_id),
            None => format!("{}:{}", self.channel, self.user_id),
        }
    }
}

/// A reply to send back through a channel.
#[derive(Debug, Clone)]
pub struct OutgoingResponse {
    pub content: String,
    /// Keyboard change; `None` leaves whatever the user currently sees.
    pub quick_replies: Option<QuickReplies>,
    pub metadata: serde_json::Value,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            quick_replies: None,
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_quick_replies(mut self, quick_replies: Option<QuickReplies>) -> Self {
        self.quick_replies = quick_replies;
        self
    }
}

/// A transport that delivers inbound text and renders outbound prompts.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique channel name, used to route responses.
    fn name(&self) -> &str;

    /// Begin receiving messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Reply to an inbound message.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    /// Verify the transport is reachable.
    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
