//! Identifier generation.

use uuid::Uuid;

/// Generate a unique ID for conversations, messages, users and tokens.
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
