//! Notifications for presentation layers observing a conversation

use super::message::RegularMessage;

/// A state change in a [`ConversationSession`](super::ConversationSession)
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A user or bot message joined the log
    MessageAppended(RegularMessage),
    /// A typing indicator was shown
    TypingStarted { id: String },
    /// A typing indicator was removed
    TypingRetracted { id: String },
    /// The waiting-for-reply flag flipped
    WaitingChanged(bool),
    /// The log was cleared; carries the (possibly rotated) session id
    SessionCleared { session_id: String },
}
