//! Storage backends for session, settings and conversation data.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use traits::{CONVERSATIONS_KEY, KeyValueStore, SETTINGS_KEY, TOKEN_KEY, USER_KEY};

use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Read and deserialize the JSON value under `key`.
///
/// # Errors
///
/// Returns an error if the read fails or the stored value is not valid JSON
/// for `T`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.put(key, &raw)
}
