//! Integration tests for the session → conversation → persistence flow.

use parley::completion::{CompletionClient, CompletionError};
use parley::core::session::{DEMO_EMAIL, DEMO_PASSWORD};
use parley::core::state::DEFAULT_TITLE;
use parley::core::{
    APOLOGY_REPLY, ConversationStore, FAILED_REPLY_ERROR, Role, SendOutcome, SessionStore,
    SettingsPatch, SettingsStore, Theme, snapshot,
};
use parley::storage::{CONVERSATIONS_KEY, FileBackend, KeyValueStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Replies "re: <prompt>", or fails when the prompt mentions "boom".
struct Canned;

#[async_trait::async_trait]
impl CompletionClient for Canned {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        if prompt.contains("boom") {
            Err(CompletionError::Api {
                status: 500,
                message: "internal".to_string(),
            })
        } else {
            Ok(format!("re: {prompt}"))
        }
    }
}

fn profile(dir: &TempDir) -> Arc<dyn KeyValueStore> {
    Arc::new(FileBackend::new(dir.path().to_path_buf()).unwrap())
}

fn signed_in(dir: &TempDir) -> SessionStore {
    let mut session = SessionStore::new(profile(dir));
    session.login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();
    session
}

#[tokio::test]
async fn conversation_survives_restart() {
    let dir = TempDir::new().unwrap();

    // First run: sign in and chat
    let session = signed_in(&dir);
    let store = ConversationStore::open(&session, Arc::new(Canned));
    let outcome = store.send_message("Hello").await;
    let id = match outcome {
        SendOutcome::Replied { conversation_id } => conversation_id,
        other => panic!("unexpected outcome: {other:?}"),
    };
    let before = store.conversations();
    store.close();

    // Second run: session and history come back from disk
    let session = SessionStore::open(profile(&dir));
    assert!(session.is_authenticated());
    let store = ConversationStore::open(&session, Arc::new(Canned));

    assert_eq!(store.conversations(), before);
    let current = store.current().unwrap();
    assert_eq!(current.id(), id);
    assert_eq!(current.title(), "Hello");
    let roles: Vec<Role> = current.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert_eq!(current.messages()[1].content, "re: Hello");
}

#[tokio::test]
async fn failed_reply_is_recorded_and_persisted() {
    let dir = TempDir::new().unwrap();
    let session = signed_in(&dir);
    let store = ConversationStore::open(&session, Arc::new(Canned));

    let outcome = store.send_message("make it go boom").await;
    assert!(matches!(outcome, SendOutcome::Failed { .. }));
    assert_eq!(store.last_error().as_deref(), Some(FAILED_REPLY_ERROR));
    assert!(!store.is_pending());

    let persisted = snapshot::load(session.storage().as_ref()).unwrap();
    let messages = persisted[0].messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, APOLOGY_REPLY);
}

#[tokio::test]
async fn logout_keeps_history_for_next_sign_in() {
    let dir = TempDir::new().unwrap();
    let mut session = signed_in(&dir);
    let store = ConversationStore::open(&session, Arc::new(Canned));
    store.send_message("remember me").await;
    store.close();

    session.logout();
    assert!(!session.is_authenticated());

    // Signed out: nothing is loaded and nothing is written
    let raw_before = session.storage().get(CONVERSATIONS_KEY).unwrap();
    let guest = ConversationStore::open(&session, Arc::new(Canned));
    assert!(guest.conversations().is_empty());
    guest.send_message("guest message").await;
    guest.close();
    assert_eq!(session.storage().get(CONVERSATIONS_KEY).unwrap(), raw_before);

    // Signing back in restores the history
    session.login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();
    let store = ConversationStore::open(&session, Arc::new(Canned));
    assert_eq!(store.current().unwrap().title(), "remember me");
}

#[tokio::test]
async fn legacy_snapshot_is_upgraded_on_next_write() {
    let dir = TempDir::new().unwrap();
    let session = signed_in(&dir);
    let legacy = r#"[{
        "id": "c1",
        "title": "Old chat",
        "messages": [
            {"id": "m1", "content": "hi", "role": "user", "timestamp": "2024-05-01T10:00:00Z"},
            {"id": "m2", "content": "hello!", "role": "bot", "timestamp": "2024-05-01T10:00:02Z"}
        ],
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-01T10:00:02Z"
    }]"#;
    session.storage().put(CONVERSATIONS_KEY, legacy).unwrap();

    let store = ConversationStore::open(&session, Arc::new(Canned));
    let current = store.current().unwrap();
    assert_eq!(current.id(), "c1");
    assert_eq!(current.messages()[1].role, Role::Assistant);

    store.send_message("still there?").await;

    let raw = session.storage().get(CONVERSATIONS_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["conversations"][0]["messages"].as_array().unwrap().len(), 4);
    assert_eq!(value["conversations"][0]["messages"][1]["role"], "assistant");
}

#[tokio::test]
async fn delete_and_create_round_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    let session = signed_in(&dir);
    let store = ConversationStore::open(&session, Arc::new(Canned));

    store.send_message("first").await;
    let second = store.create_conversation();
    store.send_message("second").await;
    let third = store.create_conversation();
    assert_eq!(third.title(), DEFAULT_TITLE);

    assert!(store.delete_conversation(third.id()));
    assert_eq!(store.current().unwrap().id(), second.id());
    store.close();

    let store = ConversationStore::open(&SessionStore::open(profile(&dir)), Arc::new(Canned));
    let titles: Vec<String> = store
        .conversations()
        .iter()
        .map(|c| c.title().to_string())
        .collect();
    assert_eq!(titles, vec!["second", "first"]);
}

#[test]
fn settings_follow_the_session() {
    let dir = TempDir::new().unwrap();
    let session = signed_in(&dir);

    let mut settings = SettingsStore::open(&session);
    settings
        .update(&SettingsPatch {
            theme: Some(Theme::Dark),
            temperature: Some(0.2),
            ..SettingsPatch::default()
        })
        .unwrap();

    let reopened = SettingsStore::open(&SessionStore::open(profile(&dir)));
    assert_eq!(reopened.settings().theme, Theme::Dark);
    assert!((reopened.settings().temperature - 0.2).abs() < f32::EPSILON);

    let signed_out = SessionStore::new(profile(&dir));
    assert_eq!(SettingsStore::open(&signed_out).settings().theme, Theme::Light);
}
