//! Configuration validation rules.

use super::schema::{Config, MAX_BRAND_NAME_CHARS, MAX_QUICK_ACTIONS, MAX_WELCOME_MESSAGE_CHARS};
use crate::storage::file::entry_name;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    let endpoint = config.responder.endpoint.trim();
    if endpoint.is_empty() {
        errors.push("responder.endpoint must not be empty".to_string());
    } else {
        match reqwest::Url::parse(endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "responder.endpoint must use http or https, got {}",
                url.scheme()
            )),
            Err(e) => errors.push(format!("responder.endpoint is not a valid URL: {}", e)),
        }
    }
    if config.responder.timeout_secs == Some(0) {
        errors.push("responder.timeout_secs must be > 0 when set".to_string());
    }
    for name in config.responder.headers.keys() {
        if reqwest::header::HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(format!("responder.headers.{} is not a valid header name", name));
        }
    }

    if config.storage.dir.trim().is_empty() {
        errors.push("storage.dir must not be empty".to_string());
    }
    for (field, key) in [
        ("session_id_key", &config.storage.session_id_key),
        ("messages_key", &config.storage.messages_key),
    ] {
        if key.trim().is_empty() {
            errors.push(format!("storage.{} must not be empty", field));
        } else if entry_name(key).is_none() {
            errors.push(format!(
                "storage.{} must not start with '.' or end with .tmp",
                field
            ));
        }
    }
    if entry_name(&config.storage.session_id_key).is_some()
        && entry_name(&config.storage.session_id_key) == entry_name(&config.storage.messages_key)
    {
        errors.push("storage.session_id_key and storage.messages_key must differ".to_string());
    }

    if config.session.fallback_reply.trim().is_empty() {
        errors.push("session.fallback_reply must not be empty".to_string());
    }
    if config.session.error_reply.trim().is_empty() {
        errors.push("session.error_reply must not be empty".to_string());
    }

    if config.widget.brand_name.chars().count() > MAX_BRAND_NAME_CHARS {
        errors.push(format!(
            "widget.brand_name must be at most {} characters",
            MAX_BRAND_NAME_CHARS
        ));
    }
    if config.widget.welcome_message.chars().count() > MAX_WELCOME_MESSAGE_CHARS {
        errors.push(format!(
            "widget.welcome_message must be at most {} characters",
            MAX_WELCOME_MESSAGE_CHARS
        ));
    }
    if config.widget.quick_actions.len() > MAX_QUICK_ACTIONS {
        errors.push(format!(
            "widget.quick_actions must have at most {} entries",
            MAX_QUICK_ACTIONS
        ));
    }
    for (idx, action) in config.widget.quick_actions.iter().enumerate() {
        if action.trim().is_empty() {
            errors.push(format!("widget.quick_actions[{}] must not be empty", idx));
        }
    }

    if !matches!(config.logging.format.to_lowercase().as_str(), "text" | "json") {
        errors.push("logging.format must be text or json".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
