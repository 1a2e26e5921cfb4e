//! # Storage Layer
//!
//! This module defines the persistence boundary for tag histories. The
//! [`TagStore`] trait is all that [`TagList`](crate::tag_list::TagList) and
//! [`History`](crate::history::History) know about storage.
//!
//! ## Contents of a Store
//!
//! - **Tags**: one record per tag, unique by name and by revision.
//! - **Properties**: the repository's fully-qualified name (`fqrn`), the schema
//!   version, and an optional `previous_revision` hash linking to the prior
//!   history snapshot.
//!
//! ## Transactions
//!
//! Mutations issued between [`TagStore::begin_transaction`] and
//! [`TagStore::commit_transaction`] become durable together or not at all.
//! [`TagStore::abort_transaction`] discards them. Outside a transaction each
//! mutation is durable on its own. Readers opening the store while a writer is
//! inside a transaction see either the old or the committed state.
//!
//! ## Implementations
//!
//! - [`sqlite::SqliteStore`]: SQLite database with `tags` and `properties` tables.
//! - [`json::JsonStore`]: One JSON document, replaced atomically on every write.
//! - [`memory::MemoryStore`]: In-memory store for testing logic without I/O.
//!
//! Backends are opened with their own `open` / `open_writable` / `create`
//! constructors. Opening a missing store fails; creating stamps the new store
//! with the repository name.

use crate::error::{HistoryError, Result};
use crate::hash::RootHash;
use crate::model::Tag;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

mod document;
pub mod json;
pub mod memory;
pub mod sqlite;

/// Version written into every new store and required when opening one.
pub const SCHEMA_VERSION: &str = "1.0";

pub const FQRN_KEY: &str = "fqrn";
pub const SCHEMA_KEY: &str = "schema";
pub const PREVIOUS_REVISION_KEY: &str = "previous_revision";

/// Storage engine behind a history file, selected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Sqlite,
    Json,
}

impl Backend {
    pub fn open(self, path: &Path, writable: bool) -> Result<Box<dyn TagStore>> {
        let store: Box<dyn TagStore> = match (self, writable) {
            (Backend::Sqlite, false) => Box::new(sqlite::SqliteStore::open(path)?),
            (Backend::Sqlite, true) => Box::new(sqlite::SqliteStore::open_writable(path)?),
            (Backend::Json, false) => Box::new(json::JsonStore::open(path)?),
            (Backend::Json, true) => Box::new(json::JsonStore::open_writable(path)?),
        };
        Ok(store)
    }

    pub fn create(self, path: &Path, fqrn: &str) -> Result<Box<dyn TagStore>> {
        let store: Box<dyn TagStore> = match self {
            Backend::Sqlite => Box::new(sqlite::SqliteStore::create(path, fqrn)?),
            Backend::Json => Box::new(json::JsonStore::create(path, fqrn)?),
        };
        Ok(store)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Sqlite => "sqlite",
            Backend::Json => "json",
        })
    }
}

impl FromStr for Backend {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "json" => Ok(Backend::Json),
            other => Err(HistoryError::Store(format!("unknown backend '{}'", other))),
        }
    }
}

// Plain strings so that TOML files and environment variables parse alike.
impl Serialize for Backend {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Backend {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Abstract interface for durable tag storage.
///
/// Every fallible operation reports failure through `Result`; a failed call
/// leaves the store as it was before the call.
pub trait TagStore {
    /// Fully-qualified name of the repository this store belongs to.
    fn fqrn(&self) -> &str;

    /// Location of the store, if it lives on disk.
    fn path(&self) -> Option<&Path>;

    fn is_writable(&self) -> bool;

    fn number_of_tags(&self) -> Result<usize>;

    fn begin_transaction(&mut self) -> Result<()>;

    fn commit_transaction(&mut self) -> Result<()>;

    /// Discard everything staged since `begin_transaction`.
    fn abort_transaction(&mut self) -> Result<()>;

    fn in_transaction(&self) -> bool;

    /// Hash of the history snapshot this one was derived from, if recorded.
    fn previous_revision(&self) -> Result<Option<RootHash>>;

    /// Record the link to the previous history snapshot. Replaces any earlier link.
    fn set_previous_revision(&mut self, hash: &RootHash) -> Result<()>;

    /// Add a tag. Fails with `TagExists` on a name or revision collision.
    fn insert(&mut self, tag: &Tag) -> Result<()>;

    /// Delete a tag by name. Deleting an absent name is not an error.
    fn remove(&mut self, name: &str) -> Result<()>;

    fn exists(&self, name: &str) -> Result<bool>;

    fn get(&self, name: &str) -> Result<Option<Tag>>;

    /// All tags, newest revision first.
    fn list(&self) -> Result<Vec<Tag>>;
}

impl<S: TagStore + ?Sized> TagStore for Box<S> {
    fn fqrn(&self) -> &str {
        (**self).fqrn()
    }

    fn path(&self) -> Option<&Path> {
        (**self).path()
    }

    fn is_writable(&self) -> bool {
        (**self).is_writable()
    }

    fn number_of_tags(&self) -> Result<usize> {
        (**self).number_of_tags()
    }

    fn begin_transaction(&mut self) -> Result<()> {
        (**self).begin_transaction()
    }

    fn commit_transaction(&mut self) -> Result<()> {
        (**self).commit_transaction()
    }

    fn abort_transaction(&mut self) -> Result<()> {
        (**self).abort_transaction()
    }

    fn in_transaction(&self) -> bool {
        (**self).in_transaction()
    }

    fn previous_revision(&self) -> Result<Option<RootHash>> {
        (**self).previous_revision()
    }

    fn set_previous_revision(&mut self, hash: &RootHash) -> Result<()> {
        (**self).set_previous_revision(hash)
    }

    fn insert(&mut self, tag: &Tag) -> Result<()> {
        (**self).insert(tag)
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        (**self).remove(name)
    }

    fn exists(&self, name: &str) -> Result<bool> {
        (**self).exists(name)
    }

    fn get(&self, name: &str) -> Result<Option<Tag>> {
        (**self).get(name)
    }

    fn list(&self) -> Result<Vec<Tag>> {
        (**self).list()
    }
}
