//! File-based storage backend.

use crate::error::Result;
use crate::storage::traits::KeyValueStore;
use std::fs;
use std::io;
use std::path::PathBuf;

/// File-based storage backend with atomic writes.
///
/// Each key is stored as `<profile dir>/<key>.json`.
#[derive(Debug)]
pub struct FileBackend {
    base_dir: PathBuf,
}

impl FileBackend {
    /// Create a new file backend.
    ///
    /// Creates the profile directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile directory cannot be created.
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(base_dir.join("profile"))?;
        Ok(Self { base_dir })
    }

    /// Get the path to a key file.
    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key: {key:?}"),
            )
            .into());
        }
        Ok(self.base_dir.join("profile").join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let temp = path.with_extension("tmp");

        // Write to temp file first
        fs::write(&temp, value)?;

        // Atomic rename - prevents a torn snapshot if the process dies mid-write
        fs::rename(&temp, &path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
