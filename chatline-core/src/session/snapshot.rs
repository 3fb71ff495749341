//! Exportable conversation snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::RegularMessage;

/// Serializable hand-off of a conversation, e.g. for download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub messages: Vec<RegularMessage>,
    pub session_id: String,
    pub exported_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Pretty JSON for writing to disk
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Suggested file name: `<brand>-chat-<session id>.json`
    pub fn file_name(&self, brand_name: &str) -> String {
        let brand = brand_name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        let brand = crate::utils::safe_filename(&brand);
        if brand.is_empty() {
            format!("chat-{}.json", self.session_id)
        } else {
            format!("{}-chat-{}.json", brand, self.session_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::Sender;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            messages: vec![RegularMessage::new(Sender::User, "hi", Utc::now())],
            session_id: "session_1_abc".to_string(),
            exported_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_field_names() {
        let json = snapshot().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["sessionId"], "session_1_abc");
        assert!(value["exportedAt"].is_string());
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_file_name() {
        let snap = snapshot();
        assert_eq!(snap.file_name("Your Brand"), "your-brand-chat-session_1_abc.json");
        assert_eq!(snap.file_name("   "), "chat-session_1_abc.json");
    }
}
