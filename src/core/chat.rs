//! Conversation store.
//!
//! Owns the conversation collection for one signed-in session and runs the
//! send/reply exchange with the completion service. State sits behind a
//! mutex that is never held across the completion call, so every mutation
//! before and after the call is atomic with respect to other store calls.
//!
//! Only one reply per conversation may be awaited at a time; a second
//! [`ConversationStore::send_message`] to a busy conversation is rejected.

use crate::completion::{CompletionClient, CompletionError};
use crate::core::session::SessionStore;
use crate::core::snapshot;
use crate::core::state::{ChatState, Conversation, DEFAULT_TITLE_MAX_CHARS, Message, derive_title};
use crate::error::Error;
use crate::storage::KeyValueStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// `last_error` value after a failed exchange.
pub const FAILED_REPLY_ERROR: &str = "Failed to get response from AI. Please try again.";

/// Assistant message appended after a failed exchange.
pub const APOLOGY_REPLY: &str =
    "Sorry, I encountered an error processing your request. Please try again later.";

/// Result of [`ConversationStore::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was empty after trimming; nothing happened.
    Empty,

    /// The target conversation already awaits a reply; nothing happened.
    Busy {
        /// The busy conversation.
        conversation_id: String,
    },

    /// The service replied and the reply was appended.
    Replied {
        /// Conversation the exchange went to.
        conversation_id: String,
    },

    /// The service failed; the apology was appended and `last_error` set.
    Failed {
        /// Conversation the exchange went to.
        conversation_id: String,

        /// Why the service failed.
        reason: String,
    },
}

/// Clears a conversation's awaited reply if the send future is dropped
/// before the reply is folded in.
struct ReplyGuard<'a> {
    state: &'a Mutex<ChatState>,
    conversation_id: &'a str,
    armed: bool,
}

impl ReplyGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ReplyGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(conversation = self.conversation_id, "send abandoned before reply");
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .finish_reply(self.conversation_id);
        }
    }
}

/// The conversation collection of one session.
///
/// Construct with [`ConversationStore::open`] when a session starts and
/// [`ConversationStore::close`] it at logout. A store opened for a signed-out
/// session works in memory only and never touches persisted conversations.
pub struct ConversationStore {
    storage: Arc<dyn KeyValueStore>,
    client: Option<Arc<dyn CompletionClient>>,
    persist: bool,
    title_max_chars: usize,
    state: Mutex<ChatState>,
}

impl ConversationStore {
    /// Open the store for `session`.
    ///
    /// If the session is authenticated the persisted collection is loaded and
    /// its most recent conversation selected. An unreadable snapshot is logged
    /// and treated as no prior data. A snapshot written by a newer format is
    /// left untouched: the store then runs in memory only.
    #[must_use]
    pub fn open(session: &SessionStore, client: Arc<dyn CompletionClient>) -> Self {
        Self::open_with(session, Some(client))
    }

    /// Open the store for browsing only.
    ///
    /// Conversations load and persist as with [`ConversationStore::open`], but
    /// no completion service is attached, so every send fails with
    /// [`CompletionError::Offline`].
    #[must_use]
    pub fn open_offline(session: &SessionStore) -> Self {
        Self::open_with(session, None)
    }

    fn open_with(session: &SessionStore, client: Option<Arc<dyn CompletionClient>>) -> Self {
        let storage = Arc::clone(session.storage());
        let mut persist = session.is_authenticated();

        let state = if persist {
            match snapshot::load(storage.as_ref()) {
                Ok(conversations) => ChatState::from_conversations(conversations),
                Err(Error::UnsupportedVersion(version)) => {
                    warn!(version, "conversations saved by a newer format, changes will not be saved");
                    persist = false;
                    ChatState::default()
                }
                Err(e) => {
                    warn!(error = %e, "failed to load conversations, starting empty");
                    ChatState::default()
                }
            }
        } else {
            ChatState::default()
        };

        Self {
            storage,
            client,
            persist,
            title_max_chars: DEFAULT_TITLE_MAX_CHARS,
            state: Mutex::new(state),
        }
    }

    /// Use a different title length limit.
    #[must_use]
    pub fn with_title_max_chars(mut self, max_chars: usize) -> Self {
        self.title_max_chars = max_chars;
        self
    }

    /// Tear the store down, discarding in-memory state.
    ///
    /// Persisted conversations are left in storage.
    pub fn close(self) {
        let count = self.lock().conversations().len();
        debug!(conversations = count, "conversation store closed");
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mirror the collection to storage while the session is authenticated.
    ///
    /// Called with the state lock held so snapshots land in mutation order.
    fn sync(&self, state: &ChatState) {
        if !self.persist {
            return;
        }
        if let Err(e) = snapshot::save(self.storage.as_ref(), state.conversations()) {
            warn!(error = %e, "failed to persist conversations");
        }
    }

    /// Whether changes are mirrored to storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.persist
    }

    /// All conversations, most recent first.
    #[must_use]
    pub fn conversations(&self) -> Vec<Conversation> {
        self.lock().conversations().to_vec()
    }

    /// Conversation `id`, if present.
    #[must_use]
    pub fn conversation(&self, id: &str) -> Option<Conversation> {
        self.lock().get(id).cloned()
    }

    /// The current conversation.
    #[must_use]
    pub fn current(&self) -> Option<Conversation> {
        self.lock().current().cloned()
    }

    /// Whether any reply is awaited.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.lock().is_pending()
    }

    /// Error from the last failed exchange.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error().map(str::to_string)
    }

    /// Start a new empty conversation and make it current.
    pub fn create_conversation(&self) -> Conversation {
        let conversation = Conversation::new();
        let mut state = self.lock();
        state.insert(conversation.clone());
        self.sync(&state);
        conversation
    }

    /// Make conversation `id` current.
    ///
    /// Returns `false`, keeping the current selection, if `id` is unknown.
    pub fn select_conversation(&self, id: &str) -> bool {
        self.lock().select(id)
    }

    /// Delete conversation `id`.
    ///
    /// If it was current, the most recent remaining conversation becomes
    /// current. Returns `false` if `id` is unknown.
    pub fn delete_conversation(&self, id: &str) -> bool {
        let mut state = self.lock();
        if !state.delete(id) {
            return false;
        }
        self.sync(&state);
        true
    }

    /// Send `text` to the current conversation and fold in the reply.
    ///
    /// With no current conversation one is created, titled from the text.
    /// The user message is appended before the service is called; the reply,
    /// or an apology if the service fails, is appended after. The pending
    /// flag is cleared exactly once on every path.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SendOutcome::Empty;
        }

        let conversation_id = {
            let mut state = self.lock();
            let id = if let Some(id) = state.current_id() {
                id.to_string()
            } else {
                let conversation =
                    Conversation::with_title(derive_title(trimmed, self.title_max_chars));
                let id = conversation.id().to_string();
                state.insert(conversation);
                id
            };

            if !state.begin_reply(&id) {
                debug!(conversation = %id, "reply already awaited, rejecting send");
                return SendOutcome::Busy {
                    conversation_id: id,
                };
            }

            state.append(&id, Message::user(text), self.title_max_chars);
            self.sync(&state);
            id
        };

        let guard = ReplyGuard {
            state: &self.state,
            conversation_id: &conversation_id,
            armed: true,
        };

        let result = match &self.client {
            Some(client) => client.complete(text).await,
            None => Err(CompletionError::Offline),
        };

        let mut state = self.lock();
        let (reply, outcome) = match result {
            Ok(reply) => (
                Message::assistant(reply),
                SendOutcome::Replied {
                    conversation_id: conversation_id.clone(),
                },
            ),
            Err(e) => {
                warn!(conversation = %conversation_id, error = %e, "completion failed");
                state.set_error(FAILED_REPLY_ERROR);
                (
                    Message::assistant(APOLOGY_REPLY),
                    SendOutcome::Failed {
                        conversation_id: conversation_id.clone(),
                        reason: e.to_string(),
                    },
                )
            }
        };

        if !state.append(&conversation_id, reply, self.title_max_chars) {
            debug!(conversation = %conversation_id, "conversation deleted before reply arrived");
        }

        state.finish_reply(&conversation_id);
        guard.disarm();
        self.sync(&state);

        outcome
    }
}
