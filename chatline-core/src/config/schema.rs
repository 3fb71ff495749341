//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for chatline
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote responder endpoint
    #[serde(default)]
    pub responder: ResponderConfig,
    /// Durable local store
    #[serde(default)]
    pub storage: StorageConfig,
    /// Conversation behaviour
    #[serde(default)]
    pub session: SessionConfig,
    /// Widget copy shown by the presentation layer
    #[serde(default)]
    pub widget: WidgetConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "~/.chatline/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}

/// Remote responder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Endpoint that accepts `{ message, sessionId, timestamp }`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Transport timeout in seconds; unset means wait for the responder indefinitely
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Extra headers sent with every exchange
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_endpoint() -> String {
    "http://localhost:3000/api/chat".to_string()
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: None,
            headers: HashMap::new(),
        }
    }
}

/// Durable local store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one file per key
    #[serde(default = "default_storage_dir")]
    pub dir: String,
    /// Key for the session identifier
    #[serde(default = "default_session_id_key")]
    pub session_id_key: String,
    /// Key for the serialized message log
    #[serde(default = "default_messages_key")]
    pub messages_key: String,
}

fn default_storage_dir() -> String {
    "~/.chatline/store".to_string()
}

fn default_session_id_key() -> String {
    "chat_session_id".to_string()
}

fn default_messages_key() -> String {
    "chat_messages".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            session_id_key: default_session_id_key(),
            messages_key: default_messages_key(),
        }
    }
}

/// Conversation behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Show an ephemeral typing indicator while a reply is pending
    #[serde(default = "default_typing_indicator")]
    pub typing_indicator: bool,
    /// Reply used when the responder answers without any text
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
    /// Reply used when the exchange itself fails
    #[serde(default = "default_error_reply")]
    pub error_reply: String,
}

fn default_typing_indicator() -> bool {
    true
}

fn default_fallback_reply() -> String {
    "I apologize, but I encountered an error processing your request.".to_string()
}

fn default_error_reply() -> String {
    "I apologize, but I'm having trouble connecting right now. Please try again in a moment."
        .to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            typing_indicator: default_typing_indicator(),
            fallback_reply: default_fallback_reply(),
            error_reply: default_error_reply(),
        }
    }
}

/// Maximum brand name length in characters
pub const MAX_BRAND_NAME_CHARS: usize = 50;
/// Maximum welcome message length in characters
pub const MAX_WELCOME_MESSAGE_CHARS: usize = 200;
/// Maximum number of quick actions on the welcome screen
pub const MAX_QUICK_ACTIONS: usize = 8;

/// Widget copy for the welcome screen and thread header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(default = "default_brand_name")]
    pub brand_name: String,
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
    /// Canned first messages offered on the welcome screen
    #[serde(default = "default_quick_actions")]
    pub quick_actions: Vec<String>,
}

fn default_brand_name() -> String {
    "Your Brand".to_string()
}

fn default_welcome_message() -> String {
    "Hello! How can I help you today?".to_string()
}

fn default_quick_actions() -> Vec<String> {
    vec![
        "Get Started".to_string(),
        "Contact Support".to_string(),
        "View Pricing".to_string(),
    ]
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            brand_name: default_brand_name(),
            welcome_message: default_welcome_message(),
            quick_actions: default_quick_actions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"responder":{"endpoint":"https://hooks.example.com/chat"}}"#)
                .unwrap();

        assert_eq!(config.responder.endpoint, "https://hooks.example.com/chat");
        assert!(config.responder.timeout_secs.is_none());
        assert_eq!(config.storage.messages_key, "chat_messages");
        assert!(config.session.typing_indicator);
        assert_eq!(config.widget.quick_actions.len(), 3);
    }

    #[test]
    fn test_default_keys_are_distinct() {
        let storage = StorageConfig::default();
        assert_ne!(storage.session_id_key, storage.messages_key);
    }
}
