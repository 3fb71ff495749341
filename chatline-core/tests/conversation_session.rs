use chatline_core::config::Config;
use chatline_core::{
    ConversationSession, FileStore, HttpResponder, KeyValueStore, Sender, SessionOptions,
};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

const MESSAGES_KEY: &str = "chat_messages";

fn open(store: &Arc<FileStore>, endpoint: String) -> ConversationSession {
    ConversationSession::initialize(
        store.clone(),
        Arc::new(HttpResponder::new(endpoint)),
        SessionOptions::default(),
    )
}

/// A responder that answers every POST with `body`; keep the mock alive
async fn replying_server(body: &str) -> (ServerGuard, Mock) {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;
    (server, mock)
}

#[tokio::test]
async fn test_success_pairs_user_and_bot() {
    let mut server = Server::new_async().await;
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp_dir.path()));
    let session = open(&store, format!("{}/api/chat", server.url()));

    let mock = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::PartialJson(json!({
            "message": "hi",
            "sessionId": session.session_id(),
        })))
        .with_status(200)
        .with_body(r#"{"response":"X"}"#)
        .expect(1)
        .create_async()
        .await;

    session.send_message("hi").unwrap().await.unwrap();

    let log = session.regular_messages();
    assert_eq!(log.len(), 2);
    assert_eq!((log[0].sender, log[0].content.as_str()), (Sender::User, "hi"));
    assert_eq!((log[1].sender, log[1].content.as_str()), (Sender::Bot, "X"));
    assert!(!session.is_waiting_for_reply());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_yields_apology() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/chat")
        .with_status(500)
        .create_async()
        .await;
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp_dir.path()));
    let session = open(&store, format!("{}/api/chat", server.url()));

    session.send_message("hi").unwrap().await.unwrap();

    let log = session.regular_messages();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].content, "hi");
    assert_eq!(log[1].sender, Sender::Bot);
    assert_eq!(log[1].content, Config::default().session.error_reply);
    assert!(!session.is_waiting_for_reply());
}

#[tokio::test]
async fn test_malformed_body_yields_apology() {
    let (server, _mock) = replying_server("definitely not json").await;
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp_dir.path()));
    let session = open(&store, format!("{}/api/chat", server.url()));

    session.send_message("hi").unwrap().await.unwrap();

    let log = session.regular_messages();
    assert_eq!(log[1].content, Config::default().session.error_reply);
}

#[tokio::test]
async fn test_message_field_is_used_when_response_absent() {
    let (server, _mock) = replying_server(r#"{"message":"from message"}"#).await;
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp_dir.path()));
    let session = open(&store, format!("{}/api/chat", server.url()));

    session.send_message("hi").unwrap().await.unwrap();

    assert_eq!(session.regular_messages()[1].content, "from message");
}

#[tokio::test]
async fn test_persisted_log_is_ordered() {
    let (server, _mock) = replying_server(r#"{"response":"ok"}"#).await;
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp_dir.path()));
    let session = open(&store, format!("{}/api/chat", server.url()));

    let handles: Vec<_> = (0..5)
        .filter_map(|i| session.send_message(&format!("message {}", i)))
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let raw = store.get(MESSAGES_KEY).unwrap().unwrap();
    let persisted: Vec<chatline_core::RegularMessage> = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted.len(), 10);
    assert!(persisted
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
}

#[tokio::test]
async fn test_session_id_survives_reinitialization() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp_dir.path()));

    let first = open(&store, "http://127.0.0.1:9/api/chat".to_string()).session_id();
    let second = open(&store, "http://127.0.0.1:9/api/chat".to_string()).session_id();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_new_session_clears_and_optionally_rotates() {
    let (server, _mock) = replying_server(r#"{"response":"ok"}"#).await;
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp_dir.path()));
    let session = open(&store, format!("{}/api/chat", server.url()));
    let original_id = session.session_id();

    session.send_message("hi").unwrap().await.unwrap();
    assert!(!session.regular_messages().is_empty());

    session.start_new_session(false);
    assert!(session.messages().is_empty());
    assert!(!session.is_waiting_for_reply());
    assert_eq!(session.session_id(), original_id);
    assert!(store.get(MESSAGES_KEY).unwrap().is_none());

    session.start_new_session(true);
    assert_ne!(session.session_id(), original_id);

    // The rotated id is what the next process sees.
    let reopened = open(&store, format!("{}/api/chat", server.url()));
    assert_eq!(reopened.session_id(), session.session_id());
}

#[tokio::test]
async fn test_rehydration_round_trip() {
    let (server, _mock) = replying_server(r#"{"response":"pong"}"#).await;
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp_dir.path()));
    let session = open(&store, format!("{}/api/chat", server.url()));

    for text in ["one", "two", "three"] {
        session.send_message(text).unwrap().await.unwrap();
    }
    let before = session.regular_messages();
    drop(session);

    let restored = open(&store, format!("{}/api/chat", server.url()));
    let after = restored.regular_messages();

    assert_eq!(after.len(), 6);
    for (original, reloaded) in before.iter().zip(after.iter()) {
        assert_eq!(original.id, reloaded.id);
        assert_eq!(original.content, reloaded.content);
        assert_eq!(original.sender, reloaded.sender);
        assert_eq!(original.timestamp, reloaded.timestamp);
    }
}

#[tokio::test]
async fn test_malformed_persisted_log_recovers_empty() {
    for garbage in ["not json at all", r#"{"messages":[]}"#, "42", r#"[{"id":1}]"#] {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::new(temp_dir.path()));
        store.set(MESSAGES_KEY, garbage).unwrap();

        let session = open(&store, "http://127.0.0.1:9/api/chat".to_string());

        assert!(session.messages().is_empty(), "input: {}", garbage);
        assert!(session.session_id().starts_with("session_"));
    }
}

#[tokio::test]
async fn test_export_snapshot_matches_log() {
    let (server, _mock) = replying_server(r#"{"response":"exported"}"#).await;
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp_dir.path()));
    let session = open(&store, format!("{}/api/chat", server.url()));

    session.send_message("hi").unwrap().await.unwrap();
    let snapshot = session.export_session();

    assert_eq!(snapshot.session_id, session.session_id());
    assert_eq!(snapshot.messages, session.regular_messages());

    let value: serde_json::Value =
        serde_json::from_str(&snapshot.to_json_pretty().unwrap()).unwrap();
    assert_eq!(value["messages"][1]["content"], "exported");
    assert_eq!(value["messages"][1]["sender"], "bot");
}

#[tokio::test]
async fn test_from_config_uses_configured_store() {
    let (server, _mock) = replying_server(r#"{"response":"configured"}"#).await;
    let temp_dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.responder.endpoint = format!("{}/api/chat", server.url());
    config.storage.dir = temp_dir.path().to_string_lossy().to_string();

    let session = ConversationSession::from_config(&config).unwrap();
    session.send_message("hi").unwrap().await.unwrap();

    assert!(temp_dir.path().join("chat_session_id").exists());
    assert!(temp_dir.path().join("chat_messages").exists());
    assert_eq!(session.regular_messages()[1].content, "configured");
}
