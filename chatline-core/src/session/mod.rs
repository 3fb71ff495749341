//! Conversation session management
//!
//! A session pairs a persisted identifier with an ordered message log. The
//! log is stored as a JSON array so it can be rehydrated after a restart.

pub mod events;
pub mod manager;
pub mod message;
pub mod snapshot;

pub use events::SessionEvent;
pub use manager::{ConversationSession, SessionOptions};
pub use message::{Message, RegularMessage, Sender, TypingIndicator};
pub use snapshot::SessionSnapshot;
