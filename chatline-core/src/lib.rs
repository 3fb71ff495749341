//! Core types and services for chatline
//!
//! This crate owns the conversation state machine behind the chat widget:
//! session identity, the ordered message log, durable persistence and the
//! single request/response exchange with the remote responder.

pub mod config;
pub mod error;
pub mod logging;
pub mod responder;
pub mod session;
pub mod storage;
pub mod utils;

pub use error::{Error, Result};
pub use responder::{ChatReply, ChatRequest, HttpResponder, Responder};
pub use session::{
    ConversationSession, Message, RegularMessage, Sender, SessionEvent, SessionOptions,
    SessionSnapshot, TypingIndicator,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
