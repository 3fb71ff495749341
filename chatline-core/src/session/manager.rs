//! Conversation session manager
//!
//! Owns the session identifier, the ordered message log, the
//! waiting-for-reply flag and every exchange with the remote responder.
//! All mutation goes through [`ConversationSession`]; presentation layers
//! read snapshots or subscribe to [`SessionEvent`]s.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::events::SessionEvent;
use super::message::{regular_messages, Message, RegularMessage, Sender, TypingIndicator};
use super::snapshot::SessionSnapshot;
use crate::config::Config;
use crate::responder::{ChatRequest, HttpResponder, Responder};
use crate::storage::{FileStore, KeyValueStore};
use crate::utils::{expand_tilde, new_session_id, truncate};

const EVENT_CAPACITY: usize = 256;

/// Tunables for a conversation session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Store key for the session identifier
    pub session_id_key: String,
    /// Store key for the message log
    pub messages_key: String,
    /// Show a typing indicator while a reply is pending
    pub typing_indicator: bool,
    /// Bot text when the responder answers without a reply
    pub fallback_reply: String,
    /// Bot text when the exchange fails
    pub error_reply: String,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            session_id_key: config.storage.session_id_key.clone(),
            messages_key: config.storage.messages_key.clone(),
            typing_indicator: config.session.typing_indicator,
            fallback_reply: config.session.fallback_reply.clone(),
            error_reply: config.session.error_reply.clone(),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

struct ConversationState {
    session_id: String,
    messages: Vec<Message>,
    /// Exchanges started in the current generation and not yet answered
    outstanding: usize,
    /// Bumped on every clear; older exchanges no longer count toward `outstanding`
    generation: u64,
}

impl ConversationState {
    /// Current instant, clamped so the log never goes backwards in time
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        self.messages
            .iter()
            .rev()
            .find_map(Message::as_regular)
            .map_or(now, |last| now.max(last.timestamp))
    }
}

struct SessionInner {
    state: Mutex<ConversationState>,
    /// Serializes store writes; always taken before `state`
    persist_lock: Mutex<()>,
    store: Arc<dyn KeyValueStore>,
    responder: Arc<dyn Responder>,
    options: SessionOptions,
    events: broadcast::Sender<SessionEvent>,
}

/// Handle to a conversation; clones share the same state
#[derive(Clone)]
pub struct ConversationSession {
    inner: Arc<SessionInner>,
}

impl ConversationSession {
    /// Restore (or create) the session id and message log from `store`
    ///
    /// Never fails: unreadable or malformed persisted state is logged and
    /// replaced with a fresh id or an empty log.
    pub fn initialize(
        store: Arc<dyn KeyValueStore>,
        responder: Arc<dyn Responder>,
        options: SessionOptions,
    ) -> Self {
        let session_id = load_session_id(store.as_ref(), &options.session_id_key);
        let messages = load_messages(store.as_ref(), &options.messages_key);
        info!(
            "Session {} initialized with {} messages",
            session_id,
            messages.len()
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                state: Mutex::new(ConversationState {
                    session_id,
                    messages,
                    outstanding: 0,
                    generation: 0,
                }),
                persist_lock: Mutex::new(()),
                store,
                responder,
                options,
                events,
            }),
        }
    }

    /// Build a file-backed session talking to the configured HTTP endpoint
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let store = FileStore::new(expand_tilde(&config.storage.dir));
        let responder = HttpResponder::from_config(&config.responder)?;
        Ok(Self::initialize(
            Arc::new(store),
            Arc::new(responder),
            SessionOptions::from_config(config),
        ))
    }

    pub fn session_id(&self) -> String {
        self.inner.state.lock().session_id.clone()
    }

    /// The visible thread, typing indicators included
    pub fn messages(&self) -> Vec<Message> {
        self.inner.state.lock().messages.clone()
    }

    /// The durable part of the thread
    pub fn regular_messages(&self) -> Vec<RegularMessage> {
        regular_messages(&self.inner.state.lock().messages)
    }

    pub fn is_waiting_for_reply(&self) -> bool {
        self.inner.state.lock().outstanding > 0
    }

    /// Receive every subsequent state change
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Submit a user message and start the exchange in the background
    ///
    /// The user message is appended before any network activity. The bot
    /// reply (or an apology on failure) is appended when the spawned task
    /// finishes; dropping the returned handle does not cancel it. Returns
    /// `None` when `content` is blank or no Tokio runtime is available.
    pub fn send_message(&self, content: &str) -> Option<JoinHandle<()>> {
        let content = content.trim();
        if content.is_empty() {
            debug!("Ignoring blank message");
            return None;
        }

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("Cannot send message outside a Tokio runtime: {}", e);
                return None;
            }
        };

        let inner = &self.inner;
        let (request, typing_id, generation) = {
            let mut state = inner.state.lock();

            let user_message =
                RegularMessage::new(Sender::User, content, state.next_timestamp());
            let request = ChatRequest {
                message: content.to_string(),
                session_id: state.session_id.clone(),
                timestamp: user_message.timestamp,
            };
            state.messages.push(user_message.clone().into());
            inner.emit(SessionEvent::MessageAppended(user_message));

            state.outstanding += 1;
            if state.outstanding == 1 {
                inner.emit(SessionEvent::WaitingChanged(true));
            }

            let typing_id = if inner.options.typing_indicator {
                let indicator = TypingIndicator::new();
                let id = indicator.id.clone();
                state.messages.push(Message::Typing(indicator));
                inner.emit(SessionEvent::TypingStarted { id: id.clone() });
                Some(id)
            } else {
                None
            };

            (request, typing_id, state.generation)
        };

        inner.persist();
        debug!(
            "Sending message for session {}: {}",
            request.session_id,
            truncate(&request.message, 80)
        );

        let inner = Arc::clone(inner);
        Some(runtime.spawn(async move {
            inner
                .complete_exchange(request, typing_id, generation)
                .await;
        }))
    }

    /// Clear the log and the waiting flag, optionally rotating the session id
    ///
    /// Exchanges still in flight run to completion and append their reply to
    /// the fresh log; they no longer hold the waiting flag.
    pub fn start_new_session(&self, rotate_id: bool) {
        let inner = &self.inner;
        let session_id = {
            let mut state = inner.state.lock();
            state.messages.clear();
            state.generation += 1;
            if rotate_id {
                state.session_id = new_session_id();
            }

            inner.emit(SessionEvent::SessionCleared {
                session_id: state.session_id.clone(),
            });
            if state.outstanding > 0 {
                state.outstanding = 0;
                inner.emit(SessionEvent::WaitingChanged(false));
            }
            state.session_id.clone()
        };

        if rotate_id {
            info!("Rotated session id to {}", session_id);
            if let Err(e) = inner
                .store
                .set(&inner.options.session_id_key, &session_id)
            {
                warn!("Failed to persist rotated session id: {}", e);
            }
        } else {
            info!("Started new conversation in session {}", session_id);
        }

        inner.persist();
    }

    /// Snapshot of the durable conversation; no state is touched
    pub fn export_session(&self) -> SessionSnapshot {
        let state = self.inner.state.lock();
        SessionSnapshot {
            messages: regular_messages(&state.messages),
            session_id: state.session_id.clone(),
            exported_at: Utc::now(),
        }
    }

    /// Write the current log to the store; failures are logged, never returned
    pub fn persist(&self) {
        self.inner.persist();
    }
}

impl SessionInner {
    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn persist(&self) {
        let _guard = self.persist_lock.lock();
        let messages = regular_messages(&self.state.lock().messages);
        let key = &self.options.messages_key;

        let result = if messages.is_empty() {
            self.store.remove(key)
        } else {
            serde_json::to_string(&messages)
                .map_err(crate::Error::from)
                .and_then(|json| self.store.set(key, &json))
        };

        if let Err(e) = result {
            warn!("Failed to persist message log: {}", e);
        }
    }

    async fn complete_exchange(
        &self,
        request: ChatRequest,
        typing_id: Option<String>,
        generation: u64,
    ) {
        let content = match self.responder.exchange(&request).await {
            Ok(reply) => match reply.text() {
                Some(text) => text.to_string(),
                None => {
                    warn!("Responder reply carried no text, using fallback");
                    self.options.fallback_reply.clone()
                }
            },
            Err(e) => {
                warn!("Exchange failed for session {}: {}", request.session_id, e);
                self.options.error_reply.clone()
            }
        };

        {
            let mut state = self.state.lock();

            if let Some(id) = typing_id {
                let before = state.messages.len();
                state
                    .messages
                    .retain(|m| !(m.is_typing() && m.id() == id));
                if state.messages.len() != before {
                    self.emit(SessionEvent::TypingRetracted { id });
                }
            }

            let bot_message = RegularMessage::new(Sender::Bot, content, state.next_timestamp());
            state.messages.push(bot_message.clone().into());
            self.emit(SessionEvent::MessageAppended(bot_message));

            // A clear already zeroed the count this exchange was part of.
            if state.generation == generation {
                state.outstanding = state.outstanding.saturating_sub(1);
                if state.outstanding == 0 {
                    self.emit(SessionEvent::WaitingChanged(false));
                }
            } else {
                debug!("Reply landed after the conversation was cleared");
            }
        }

        self.persist();
    }
}

fn load_session_id(store: &dyn KeyValueStore, key: &str) -> String {
    match store.get(key) {
        Ok(Some(id)) if !id.trim().is_empty() => return id.trim().to_string(),
        Ok(_) => {}
        Err(e) => warn!("Failed to read session id, generating a new one: {}", e),
    }

    let id = new_session_id();
    if let Err(e) = store.set(key, &id) {
        warn!("Failed to persist session id: {}", e);
    }
    info!("Created session {}", id);
    id
}

fn load_messages(store: &dyn KeyValueStore, key: &str) -> Vec<Message> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Failed to read message log: {}", e);
            return Vec::new();
        }
    };

    let mut messages: Vec<RegularMessage> = match serde_json::from_str(&raw) {
        Ok(messages) => messages,
        Err(e) => {
            warn!("Discarding malformed message log: {}", e);
            if let Err(e) = store.remove(key) {
                warn!("Failed to remove malformed message log: {}", e);
            }
            return Vec::new();
        }
    };

    // Stable, so equal timestamps keep their stored order.
    messages.sort_by_key(|m| m.timestamp);
    let mut seen = HashSet::new();
    messages.retain(|m| seen.insert(m.id.clone()));

    messages.into_iter().map(Message::Regular).collect()
}
