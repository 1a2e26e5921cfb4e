use super::document::{HistoryDocument, StagedDocument};
use super::TagStore;
use crate::error::{HistoryError, Result};
use crate::hash::RootHash;
use crate::model::Tag;
use std::cell::Cell;
use std::path::Path;

/// In-memory tag store for testing.
///
/// Behaves like the durable backends (transactions, read-only handles,
/// uniqueness checks) but keeps everything in process memory.
pub struct MemoryStore {
    staged: StagedDocument,
    writable: bool,
    simulate_write_error: Cell<bool>,
    simulate_abort_error: Cell<bool>,
}

impl MemoryStore {
    /// Creates an empty, writable store for the given repository.
    pub fn create(fqrn: &str) -> Self {
        Self {
            staged: StagedDocument::new(HistoryDocument::new(fqrn)),
            writable: true,
            simulate_write_error: Cell::new(false),
            simulate_abort_error: Cell::new(false),
        }
    }

    /// Creates a store that rejects every mutation.
    pub fn read_only(fqrn: &str, tags: &[Tag]) -> Self {
        let mut doc = HistoryDocument::new(fqrn);
        doc.tags = tags.to_vec();
        Self {
            staged: StagedDocument::new(doc),
            writable: false,
            simulate_write_error: Cell::new(false),
            simulate_abort_error: Cell::new(false),
        }
    }

    /// Make every subsequent write (and commit) fail with a store error.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Make `abort_transaction` fail, leaving the transaction open.
    pub fn set_simulate_abort_error(&self, simulate: bool) {
        self.simulate_abort_error.set(simulate);
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(HistoryError::ReadOnly)
        }
    }

    fn mutate<T>(&mut self, change: impl FnOnce(&mut HistoryDocument) -> Result<T>) -> Result<T> {
        self.ensure_writable()?;
        let fail = self.simulate_write_error.get();
        self.staged.apply(|_| write_result(fail), change)
    }
}

fn write_result(fail: bool) -> Result<()> {
    if fail {
        Err(HistoryError::Store("Simulated write error".to_string()))
    } else {
        Ok(())
    }
}

impl TagStore for MemoryStore {
    fn fqrn(&self) -> &str {
        &self.staged.current().fqrn
    }

    fn path(&self) -> Option<&Path> {
        None
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn number_of_tags(&self) -> Result<usize> {
        Ok(self.staged.current().tags.len())
    }

    fn begin_transaction(&mut self) -> Result<()> {
        self.ensure_writable()?;
        self.staged.begin()
    }

    fn commit_transaction(&mut self) -> Result<()> {
        let fail = self.simulate_write_error.get();
        self.staged.commit(|_| write_result(fail))
    }

    fn abort_transaction(&mut self) -> Result<()> {
        if self.simulate_abort_error.get() {
            return Err(HistoryError::Store("Simulated abort error".to_string()));
        }
        self.staged.abort()
    }

    fn in_transaction(&self) -> bool {
        self.staged.in_transaction()
    }

    fn previous_revision(&self) -> Result<Option<RootHash>> {
        Ok(self.staged.current().previous_revision)
    }

    fn set_previous_revision(&mut self, hash: &RootHash) -> Result<()> {
        let hash = *hash;
        self.mutate(|doc| {
            doc.previous_revision = Some(hash);
            Ok(())
        })
    }

    fn insert(&mut self, tag: &Tag) -> Result<()> {
        self.mutate(|doc| doc.insert(tag))
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        self.mutate(|doc| {
            doc.remove(name);
            Ok(())
        })
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.staged.current().get(name).is_some())
    }

    fn get(&self, name: &str) -> Result<Option<Tag>> {
        Ok(self.staged.current().get(name).cloned())
    }

    fn list(&self) -> Result<Vec<Tag>> {
        Ok(self.staged.current().sorted_tags())
    }
}
