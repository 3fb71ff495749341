//! Message data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::new_message_id;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => f.write_str("user"),
            Sender::Bot => f.write_str("bot"),
        }
    }
}

/// A chat message that belongs in the durable log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularMessage {
    /// Unique within a session
    pub id: String,
    pub content: String,
    pub sender: Sender,
    /// Serialized as RFC 3339
    pub timestamp: DateTime<Utc>,
}

impl RegularMessage {
    /// Create a message stamped with a fresh id
    pub fn new(sender: Sender, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: new_message_id(),
            content: content.into(),
            sender,
            timestamp,
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Placeholder shown while a reply is pending; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingIndicator {
    pub id: String,
}

impl TypingIndicator {
    pub fn new() -> Self {
        Self {
            id: new_message_id(),
        }
    }
}

impl Default for TypingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

/// An entry in the visible thread
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Regular(RegularMessage),
    Typing(TypingIndicator),
}

impl Message {
    pub fn id(&self) -> &str {
        match self {
            Message::Regular(msg) => &msg.id,
            Message::Typing(indicator) => &indicator.id,
        }
    }

    /// The durable part of this entry, if any
    pub fn as_regular(&self) -> Option<&RegularMessage> {
        match self {
            Message::Regular(msg) => Some(msg),
            Message::Typing(_) => None,
        }
    }

    pub fn is_typing(&self) -> bool {
        matches!(self, Message::Typing(_))
    }
}

impl From<RegularMessage> for Message {
    fn from(msg: RegularMessage) -> Self {
        Message::Regular(msg)
    }
}

/// Collect the regular messages of a thread, dropping typing indicators
pub fn regular_messages(messages: &[Message]) -> Vec<RegularMessage> {
    messages
        .iter()
        .filter_map(Message::as_regular)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let timestamp = DateTime::parse_from_rfc3339("2026-10-18T09:30:00.123Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut msg = RegularMessage::new(Sender::Bot, "Hi there!", timestamp);
        msg.id = "m-1".to_string();

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["id"], "m-1");
        assert_eq!(value["sender"], "bot");
        assert_eq!(value["content"], "Hi there!");

        let decoded: RegularMessage = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.timestamp, timestamp);
    }

    #[test]
    fn test_unknown_sender_rejected() {
        let raw = r#"{"id":"1","content":"x","sender":"system","timestamp":"2026-10-18T09:30:00Z"}"#;
        assert!(serde_json::from_str::<RegularMessage>(raw).is_err());
    }

    #[test]
    fn test_regular_messages_skips_typing() {
        let thread = vec![
            Message::from(RegularMessage::new(Sender::User, "hi", Utc::now())),
            Message::Typing(TypingIndicator::new()),
        ];

        let regular = regular_messages(&thread);
        assert_eq!(regular.len(), 1);
        assert!(regular[0].is_user());
        assert!(thread[1].is_typing());
        assert!(thread[1].as_regular().is_none());
    }
}
