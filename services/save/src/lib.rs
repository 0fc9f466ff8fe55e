#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Durable key/value persistence for the Bastion Defence runtime.
//!
//! A [`PersistenceBackend`] owns the authoritative string-keyed mapping;
//! writes are durable before they return. The [`SaveService`] façade is
//! stateless and adds typed JSON round-trips on top. A missing key is an
//! absent value, never an error; a serialization failure is surfaced to the
//! caller rather than swallowed.

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Failures surfaced by persistence operations.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The backend could not read or flush its storage.
    #[error("persistence i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// A value could not be serialized or deserialized as JSON text.
    #[error("persistence serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable string-keyed key/value store with UTF-8 text values.
pub trait PersistenceBackend {
    /// Stores `value` under `key`; the write is durable before returning.
    fn write(&mut self, key: &str, value: &str) -> Result<(), SaveError>;

    /// Retrieves the value stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>, SaveError>;
}

/// In-memory backend for tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: BTreeMap<String, String>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceBackend for MemoryBackend {
    fn write(&mut self, key: &str, value: &str) -> Result<(), SaveError> {
        let _ = self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>, SaveError> {
        Ok(self.values.get(key).cloned())
    }
}

/// File-backed backend storing all keys in a single JSON map file.
///
/// Every write rewrites the file and flushes it to disk before returning,
/// so the contract's durability guarantee holds per operation.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileBackend {
    /// Opens the backend at `path`, loading any existing contents.
    ///
    /// A missing file is an empty store; a corrupt file is reported and
    /// treated as empty rather than aborting startup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SaveError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(values) => values,
                Err(err) => {
                    warn!(
                        "save file {} is corrupt ({err}); starting empty",
                        path.display()
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(SaveError::Io(err)),
        };
        Ok(Self { path, values })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), SaveError> {
        let text = serde_json::to_string_pretty(&self.values)?;
        let mut file = fs::File::create(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}

impl PersistenceBackend for FileBackend {
    fn write(&mut self, key: &str, value: &str) -> Result<(), SaveError> {
        let _ = self.values.insert(key.to_owned(), value.to_owned());
        self.flush()
    }

    fn read(&self, key: &str) -> Result<Option<String>, SaveError> {
        Ok(self.values.get(key).cloned())
    }
}

/// Stateless façade adding typed round-trips over a persistence backend.
#[derive(Debug)]
pub struct SaveService<B: PersistenceBackend> {
    backend: B,
}

impl<B: PersistenceBackend> SaveService<B> {
    /// Creates the façade over the provided backend.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Stores a raw string value under `key`.
    pub fn save(&mut self, key: &str, value: &str) -> Result<(), SaveError> {
        debug!("save '{key}' ({} bytes)", value.len());
        self.backend.write(key, value)
    }

    /// Retrieves the raw string value stored under `key`, if any.
    pub fn load(&self, key: &str) -> Result<Option<String>, SaveError> {
        self.backend.read(key)
    }

    /// Serializes `value` as JSON text and stores it under `key`.
    pub fn save_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), SaveError> {
        let text = serde_json::to_string(value)?;
        self.save(key, &text)
    }

    /// Loads and deserializes the JSON value stored under `key`.
    ///
    /// Unknown fields in the stored text are ignored; a missing key is
    /// `Ok(None)`; malformed text is an error for the caller to handle.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SaveError> {
        match self.backend.read(key)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }
}
