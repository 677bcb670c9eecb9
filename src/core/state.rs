//! Conversation data model and collection state transitions.

use crate::core::id::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Title given to conversations created with no message yet.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Maximum title length in characters before truncation.
pub const DEFAULT_TITLE_MAX_CHARS: usize = 30;

/// Marker appended to truncated titles.
const ELLIPSIS: &str = "...";

/// Derive a conversation title from message text.
///
/// The text is trimmed and cut to `max_chars` characters, with `...`
/// appended when anything was cut.
#[must_use]
pub fn derive_title(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The signed-in user.
    User,

    /// The completion service. Older snapshots call this `bot`.
    #[serde(alias = "bot")]
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier.
    pub id: String,

    /// Message text.
    pub content: String,

    /// Author.
    pub role: Role,

    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped now.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// An ordered, titled thread of messages.
///
/// Messages are append-only. The title follows the first user message and
/// is fixed once the conversation has any messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    id: String,
    title: String,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation with the default title.
    #[must_use]
    pub fn new() -> Self {
        Self::with_title(DEFAULT_TITLE)
    }

    /// Create an empty conversation with the given title.
    #[must_use]
    pub fn with_title(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            title: title.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Conversation identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Messages in chronological order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent message, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// When the conversation was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When a message was last appended.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append a message, deriving the title if this is the first user message.
    pub(crate) fn append(&mut self, message: Message, title_max_chars: usize) {
        if self.messages.is_empty() && message.role == Role::User {
            self.title = derive_title(&message.content, title_max_chars);
        }
        self.messages.push(message);
        // Clock skew must not break updated_at >= created_at
        self.updated_at = Utc::now().max(self.created_at);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory conversation collection.
///
/// Conversations are ordered most-recently-created first. The current
/// conversation is tracked by id and always names a member of the collection.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    conversations: Vec<Conversation>,
    current: Option<String>,
    pending: bool,
    last_error: Option<String>,
    in_flight: HashSet<String>,
}

impl ChatState {
    /// Build state from a loaded collection, selecting the head.
    #[must_use]
    pub fn from_conversations(conversations: Vec<Conversation>) -> Self {
        let current = conversations.first().map(|c| c.id.clone());
        Self {
            conversations,
            current,
            ..Self::default()
        }
    }

    /// All conversations, most recent first.
    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Look up a conversation by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Id of the current conversation.
    #[must_use]
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The current conversation.
    #[must_use]
    pub fn current(&self) -> Option<&Conversation> {
        self.current.as_deref().and_then(|id| self.get(id))
    }

    /// Whether any reply is awaited.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Error from the last failed exchange.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Insert a conversation at the front and make it current.
    pub(crate) fn insert(&mut self, conversation: Conversation) {
        self.current = Some(conversation.id.clone());
        self.conversations.insert(0, conversation);
    }

    /// Make `id` current. Unknown ids leave the selection untouched.
    pub(crate) fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.current = Some(id.to_string());
        true
    }

    /// Remove `id`. If it was current, the new head becomes current.
    pub(crate) fn delete(&mut self, id: &str) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            return false;
        }
        if self.current.as_deref() == Some(id) {
            self.current = self.conversations.first().map(|c| c.id.clone());
        }
        true
    }

    /// Append `message` to conversation `id`.
    ///
    /// Returns `false` if the conversation no longer exists.
    pub(crate) fn append(&mut self, id: &str, message: Message, title_max_chars: usize) -> bool {
        match self.conversations.iter_mut().find(|c| c.id == id) {
            Some(conversation) => {
                conversation.append(message, title_max_chars);
                true
            }
            None => false,
        }
    }

    /// Mark a reply as awaited for `id`.
    ///
    /// Returns `false` without touching state if one is already awaited.
    pub(crate) fn begin_reply(&mut self, id: &str) -> bool {
        if !self.in_flight.insert(id.to_string()) {
            return false;
        }
        self.pending = true;
        self.last_error = None;
        true
    }

    /// Clear the awaited reply for `id`.
    pub(crate) fn finish_reply(&mut self, id: &str) {
        self.in_flight.remove(id);
        self.pending = !self.in_flight.is_empty();
    }

    /// Record a failed exchange.
    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }
}
