//! Versioned persistence of the conversation collection.
//!
//! The whole collection is written as one snapshot under
//! [`CONVERSATIONS_KEY`], replacing the previous one:
//!
//! ```json
//! { "version": 1, "conversations": [ ... ] }
//! ```
//!
//! A bare JSON array is the unversioned format written by earlier clients and
//! is read as version 0.

use crate::core::state::Conversation;
use crate::error::{Error, Result};
use crate::storage::{CONVERSATIONS_KEY, KeyValueStore};
use serde::{Deserialize, Serialize};

/// Snapshot format version written by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    conversations: &'a [Conversation],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotIn {
    Versioned {
        version: u32,
        conversations: Vec<Conversation>,
    },
    Legacy(Vec<Conversation>),
}

/// Serialize a collection into a snapshot payload.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(conversations: &[Conversation]) -> Result<String> {
    let snapshot = SnapshotOut {
        version: SNAPSHOT_VERSION,
        conversations,
    };
    Ok(serde_json::to_string(&snapshot)?)
}

/// Parse a snapshot payload, migrating older formats.
///
/// # Errors
///
/// Returns an error if the payload is not a snapshot or was written by a
/// newer format version.
pub fn decode(raw: &str) -> Result<Vec<Conversation>> {
    match serde_json::from_str(raw)? {
        SnapshotIn::Versioned {
            version,
            conversations,
        } => {
            if version > SNAPSHOT_VERSION {
                return Err(Error::UnsupportedVersion(version));
            }
            Ok(conversations)
        }
        SnapshotIn::Legacy(conversations) => Ok(conversations),
    }
}

/// Read the persisted collection. A missing snapshot is an empty collection.
///
/// # Errors
///
/// Returns an error if the read fails or the snapshot cannot be decoded.
pub fn load(store: &dyn KeyValueStore) -> Result<Vec<Conversation>> {
    match store.get(CONVERSATIONS_KEY)? {
        Some(raw) => decode(&raw),
        None => Ok(Vec::new()),
    }
}

/// Replace the persisted collection.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save(store: &dyn KeyValueStore, conversations: &[Conversation]) -> Result<()> {
    let raw = encode(conversations)?;
    store.put(CONVERSATIONS_KEY, &raw)
}
