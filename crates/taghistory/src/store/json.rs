use super::document::{HistoryDocument, StagedDocument};
use super::TagStore;
use crate::error::{HistoryError, Result};
use crate::hash::RootHash;
use crate::model::Tag;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Tag store kept in a single JSON document.
///
/// The document is read once when the store is opened. Every durable write
/// replaces the whole file atomically (temp file, then rename), so a reader
/// never sees a half-written history.
pub struct JsonStore {
    path: PathBuf,
    staged: StagedDocument,
    writable: bool,
}

impl JsonStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_mode(path.as_ref(), false)
    }

    pub fn open_writable(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_mode(path.as_ref(), true)
    }

    pub fn create(path: impl AsRef<Path>, fqrn: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            return Err(HistoryError::Store(format!(
                "{} already exists",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let doc = HistoryDocument::new(fqrn);
        write_document(&path, &doc)?;
        info!(path = %path.display(), fqrn, "created json history");
        Ok(Self {
            path,
            staged: StagedDocument::new(doc),
            writable: true,
        })
    }

    fn open_with_mode(path: &Path, writable: bool) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let doc: HistoryDocument = serde_json::from_str(&content)?;
        doc.validate()?;
        debug!(
            path = %path.display(),
            fqrn = %doc.fqrn,
            tags = doc.tags.len(),
            writable,
            "opened json history"
        );
        Ok(Self {
            path: path.to_path_buf(),
            staged: StagedDocument::new(doc),
            writable,
        })
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
        let path = &self.path;
        self.staged.apply(|doc| write_document(path, doc), change)
    }
}

fn write_document(path: &Path, doc: &HistoryDocument) -> Result<()> {
    let content = serde_json::to_string_pretty(doc)?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("history");

    // Atomic write
    let tmp = dir.join(format!(".{}-{}.tmp", stem, Uuid::new_v4()));
    fs::write(&tmp, content)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(HistoryError::Io(e));
    }
    Ok(())
}

impl TagStore for JsonStore {
    fn fqrn(&self) -> &str {
        &self.staged.current().fqrn
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
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
        let path = &self.path;
        self.staged.commit(|doc| write_document(path, doc))?;
        debug!(path = %self.path.display(), "committed json history");
        Ok(())
    }

    fn abort_transaction(&mut self) -> Result<()> {
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
