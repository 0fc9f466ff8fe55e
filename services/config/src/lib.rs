#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Configuration registry for the Bastion Defence runtime.
//!
//! Payloads are TOML files discovered once, at construction, under a flat
//! asset root. Each file names its payload kind with a stable
//! author-assigned identifier (the [`ConfigPayload::KIND`] constant of the
//! matching Rust type) plus an optional entry name for payloads that share a
//! kind, and carries the payload fields in a `[payload]` table:
//!
//! ```toml
//! kind = "LevelConfig"
//! name = "Lvl_01"
//!
//! [payload]
//! level = "Lvl_01"
//! waves = []
//! ```
//!
//! Entries are immutable after load; [`ConfigRegistry::load_all`] is the
//! only re-sync. Duplicate names keep the first entry discovered.

mod payloads;

pub use payloads::{
    AudioConfig, BalanceConfig, GameConfig, LevelConfig, LevelVisualConfig, WaveEntry,
};

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use log::{error, warn};
use serde::{de::DeserializeOwned, Deserialize};

/// Contract implemented by every typed configuration payload.
pub trait ConfigPayload: DeserializeOwned {
    /// Stable author-assigned identifier of the payload kind.
    ///
    /// Deliberately not a reflected type name: the constant survives
    /// renames and rules out collisions between shape-compatible types.
    const KIND: &'static str;
}

#[derive(Deserialize)]
struct ConfigFile {
    kind: String,
    name: Option<String>,
    payload: toml::Value,
}

#[derive(Clone, Debug)]
struct Entry {
    kind: String,
    path: PathBuf,
    value: toml::Value,
}

/// Eagerly loaded, name-keyed store of configuration payloads.
#[derive(Debug)]
pub struct ConfigRegistry {
    root: PathBuf,
    entries: BTreeMap<String, Entry>,
}

impl ConfigRegistry {
    /// Creates a registry rooted at the provided directory and performs the
    /// initial discovery scan.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut registry = Self {
            root: root.into(),
            entries: BTreeMap::new(),
        };
        let _ = registry.load_all();
        registry
    }

    /// Directory the registry discovers payloads under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discards all entries and rescans the asset root.
    ///
    /// Discovery is deterministic: files are visited in path order and the
    /// first payload claiming a name wins; later duplicates are logged as
    /// errors and skipped. Returns the number of entries loaded.
    pub fn load_all(&mut self) -> usize {
        self.entries.clear();
        let mut paths = match fs::read_dir(&self.root) {
            Ok(dir) => dir
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
                .collect::<Vec<_>>(),
            Err(err) => {
                error!(
                    "config discovery failed under {}: {err}",
                    self.root.display()
                );
                return 0;
            }
        };
        paths.sort();
        for path in paths {
            if let Some((name, entry)) = parse_entry(&path) {
                if self.entries.contains_key(&name) {
                    error!(
                        "duplicate config name '{name}' in {}; keeping the first",
                        path.display()
                    );
                    continue;
                }
                let _ = self.entries.insert(name, entry);
            }
        }
        if self.entries.is_empty() {
            warn!(
                "config discovery found no payloads under {}",
                self.root.display()
            );
        }
        self.entries.len()
    }

    /// Resolves the payload registered under `T`'s canonical kind name.
    #[must_use]
    pub fn get<T: ConfigPayload>(&self) -> Option<T> {
        self.get_named(T::KIND)
    }

    /// Resolves a payload by explicit name, requiring it to be of kind `T`.
    #[must_use]
    pub fn get_named<T: ConfigPayload>(&self, name: &str) -> Option<T> {
        let entry = self.entries.get(name)?;
        if entry.kind != T::KIND {
            warn!(
                "config '{name}' is of kind '{}', not '{}'",
                entry.kind,
                T::KIND
            );
            return None;
        }
        match entry.value.clone().try_into() {
            Ok(payload) => Some(payload),
            Err(err) => {
                error!("config '{name}' failed to deserialize: {err}");
                None
            }
        }
    }

    /// Reports whether a payload is registered under `T`'s kind name.
    #[must_use]
    pub fn has<T: ConfigPayload>(&self) -> bool {
        self.entries
            .get(T::KIND)
            .is_some_and(|entry| entry.kind == T::KIND)
    }

    /// Reports whether any payload is registered under the provided name.
    #[must_use]
    pub fn has_named(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Re-reads the backing file of the entry registered under `T`'s kind
    /// name, replacing the current mapping. Returns whether it succeeded.
    pub fn reload<T: ConfigPayload>(&mut self) -> bool {
        self.reload_named(T::KIND)
    }

    /// Re-reads the backing file of the named entry, replacing the current
    /// mapping under the name the file declares.
    ///
    /// A file that renamed itself onto a name another entry already holds
    /// is rejected, keeping both entries unchanged; first wins on reload
    /// exactly as it does during discovery.
    pub fn reload_named(&mut self, name: &str) -> bool {
        let path = match self.entries.get(name) {
            Some(entry) => entry.path.clone(),
            None => {
                warn!("cannot reload unknown config '{name}'");
                return false;
            }
        };
        match parse_entry(&path) {
            Some((new_name, entry)) => {
                if new_name != name && self.entries.contains_key(&new_name) {
                    error!(
                        "reload of config '{name}' renames it to '{new_name}', \
                         which is already registered; keeping the first"
                    );
                    return false;
                }
                let _ = self.entries.remove(name);
                let _ = self.entries.insert(new_name, entry);
                true
            }
            None => false,
        }
    }

    /// Number of loaded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the registry holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterator over loaded entry names in deterministic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn parse_entry(path: &Path) -> Option<(String, Entry)> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            error!("failed to read config {}: {err}", path.display());
            return None;
        }
    };
    let file: ConfigFile = match toml::from_str(&text) {
        Ok(file) => file,
        Err(err) => {
            error!("failed to parse config {}: {err}", path.display());
            return None;
        }
    };
    let name = file.name.unwrap_or_else(|| file.kind.clone());
    Some((
        name,
        Entry {
            kind: file.kind,
            path: path.to_path_buf(),
            value: file.payload,
        },
    ))
}
