//! Core chat types and stores.

pub mod chat;
pub mod id;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod state;

pub use chat::{APOLOGY_REPLY, ConversationStore, FAILED_REPLY_ERROR, SendOutcome};
pub use session::{AuthState, RegistrationForm, SessionStore, User};
pub use settings::{AiStyle, SettingsPatch, SettingsStore, Theme, UserSettings};
pub use state::{ChatState, Conversation, Message, Role};
