//! CLI command implementations.
//!
//! Each command has a `run`-style entry that opens the profile named by the
//! configuration, and a `*_with` function over an already-open store that
//! writes to any [`std::io::Write`].

pub mod auth;
pub mod conversations;
pub mod send;
pub mod settings;

use crate::completion::GeminiClient;
use crate::config::Config;
use crate::core::{ConversationStore, SessionStore, SettingsStore};
use crate::error::{Error, Result};
use crate::storage::{FileBackend, KeyValueStore};
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;

/// Open the profile storage named by `config`.
fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(FileBackend::new(config.storage.path.clone())?))
}

/// Restore the persisted session, failing if nobody is signed in.
fn require_session(storage: Arc<dyn KeyValueStore>) -> Result<SessionStore> {
    let session = SessionStore::open(storage);
    if let Some(error) = &session.state().error {
        eprintln!("parley: {error}");
    }
    if session.is_authenticated() {
        Ok(session)
    } else {
        Err(Error::NotAuthenticated)
    }
}

/// Open the signed-in user's conversations for browsing and editing.
fn open_history(config: &Config) -> Result<ConversationStore> {
    let session = require_session(open_storage(config)?)?;
    Ok(ConversationStore::open_offline(&session).with_title_max_chars(config.chat.title_max_chars))
}

/// Open the signed-in user's conversations, wired to the completion service.
fn open_conversations(config: &Config) -> Result<ConversationStore> {
    let session = require_session(open_storage(config)?)?;
    let temperature = SettingsStore::open(&session).settings().temperature;
    let client = GeminiClient::new(&config.completion)?.with_temperature(temperature);
    if !client.has_credential() {
        tracing::warn!("no API key configured; replies will fail");
    }
    Ok(ConversationStore::open(&session, Arc::new(client))
        .with_title_max_chars(config.chat.title_max_chars))
}

/// Format UTC time as local time for display.
fn format_local_time(utc: DateTime<Utc>) -> String {
    let local: DateTime<Local> = utc.into();
    local.format("%Y-%m-%d %H:%M").to_string()
}
