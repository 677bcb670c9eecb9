//! Storage trait definitions.

use crate::error::Result;

/// Key of the session token.
pub const TOKEN_KEY: &str = "token";

/// Key of the serialized signed-in user.
pub const USER_KEY: &str = "user";

/// Key of the serialized user settings.
pub const SETTINGS_KEY: &str = "userSettings";

/// Key of the serialized conversation collection.
pub const CONVERSATIONS_KEY: &str = "conversations";

/// Durable key/value storage scoped to one profile.
///
/// Values are opaque strings; callers store JSON.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn remove(&self, key: &str) -> Result<()>;

    /// Whether a value exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}
