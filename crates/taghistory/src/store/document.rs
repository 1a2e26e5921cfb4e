//! Whole-history document shared by the JSON and in-memory backends.
//!
//! Both backends hold the complete history in memory and differ only in where
//! a committed document goes. [`StagedDocument`] keeps the last committed
//! document plus an optional working copy for the open transaction.

use super::SCHEMA_VERSION;
use crate::error::{HistoryError, Result};
use crate::hash::RootHash;
use crate::model::Tag;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct HistoryDocument {
    pub schema: String,
    pub fqrn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_revision: Option<RootHash>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl HistoryDocument {
    pub fn new(fqrn: &str) -> Self {
        Self {
            schema: SCHEMA_VERSION.to_string(),
            fqrn: fqrn.to_string(),
            previous_revision: None,
            tags: Vec::new(),
        }
    }

    /// Rejects documents written by another schema or violating tag uniqueness.
    pub fn validate(&self) -> Result<()> {
        if self.schema != SCHEMA_VERSION {
            return Err(HistoryError::SchemaMismatch {
                found: self.schema.clone(),
                expected: SCHEMA_VERSION.to_string(),
            });
        }
        let mut names = HashSet::new();
        let mut revisions = HashSet::new();
        for tag in &self.tags {
            if !names.insert(tag.name.as_str()) {
                return Err(HistoryError::Corrupt(format!(
                    "duplicate tag name '{}'",
                    tag.name
                )));
            }
            if !revisions.insert(tag.revision) {
                return Err(HistoryError::Corrupt(format!(
                    "duplicate revision {}",
                    tag.revision
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    pub fn insert(&mut self, tag: &Tag) -> Result<()> {
        if self
            .tags
            .iter()
            .any(|t| t.name == tag.name || t.revision == tag.revision)
        {
            return Err(HistoryError::TagExists {
                name: tag.name.clone(),
                revision: tag.revision,
            });
        }
        self.tags.push(tag.clone());
        Ok(())
    }

    pub fn remove(&mut self, name: &str) {
        self.tags.retain(|t| t.name != name);
    }

    pub fn sorted_tags(&self) -> Vec<Tag> {
        let mut tags = self.tags.clone();
        tags.sort_by(|a, b| b.cmp(a));
        tags
    }
}

pub(crate) struct StagedDocument {
    committed: HistoryDocument,
    working: Option<HistoryDocument>,
}

impl StagedDocument {
    pub fn new(committed: HistoryDocument) -> Self {
        Self {
            committed,
            working: None,
        }
    }

    /// The document as seen by this handle, including staged changes.
    pub fn current(&self) -> &HistoryDocument {
        self.working.as_ref().unwrap_or(&self.committed)
    }

    pub fn in_transaction(&self) -> bool {
        self.working.is_some()
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.working.is_some() {
            return Err(HistoryError::Transaction(
                "a transaction is already active".to_string(),
            ));
        }
        self.working = Some(self.committed.clone());
        Ok(())
    }

    /// Persists the working copy. On failure the transaction stays open so
    /// the caller can retry or abort.
    pub fn commit(&mut self, persist: impl FnOnce(&HistoryDocument) -> Result<()>) -> Result<()> {
        let working = self
            .working
            .take()
            .ok_or_else(|| HistoryError::Transaction("no active transaction".to_string()))?;
        if let Err(e) = persist(&working) {
            self.working = Some(working);
            return Err(e);
        }
        self.committed = working;
        Ok(())
    }

    pub fn abort(&mut self) -> Result<()> {
        self.working
            .take()
            .map(|_| ())
            .ok_or_else(|| HistoryError::Transaction("no active transaction".to_string()))
    }

    /// Applies `change` to the working copy, or, outside a transaction, to a
    /// fresh copy that is persisted before it replaces the committed document.
    pub fn apply<T>(
        &mut self,
        persist: impl FnOnce(&HistoryDocument) -> Result<()>,
        change: impl FnOnce(&mut HistoryDocument) -> Result<T>,
    ) -> Result<T> {
        if let Some(working) = self.working.as_mut() {
            return change(working);
        }
        let mut next = self.committed.clone();
        let out = change(&mut next)?;
        persist(&next)?;
        self.committed = next;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::DIGEST_LEN;
    use crate::model::UpdateChannel;
    use chrono::{TimeZone, Utc};

    fn tag(name: &str, revision: u32) -> Tag {
        Tag::new(
            name,
            RootHash::sha1([revision as u8; DIGEST_LEN]),
            0,
            revision,
            Utc.timestamp_opt(revision as i64, 0).unwrap(),
            UpdateChannel::Trunk,
            "",
        )
    }

    fn ok(_: &HistoryDocument) -> Result<()> {
        Ok(())
    }

    #[test]
    fn validate_rejects_duplicates() {
        let mut doc = HistoryDocument::new("repo.example.org");
        doc.tags = vec![tag("a", 1), tag("a", 2)];
        assert!(matches!(doc.validate(), Err(HistoryError::Corrupt(_))));

        doc.tags = vec![tag("a", 1), tag("b", 1)];
        assert!(matches!(doc.validate(), Err(HistoryError::Corrupt(_))));
    }

    #[test]
    fn validate_rejects_foreign_schema() {
        let mut doc = HistoryDocument::new("repo.example.org");
        doc.schema = "0.9".to_string();
        assert!(matches!(
            doc.validate(),
            Err(HistoryError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn apply_outside_transaction_commits() {
        let mut staged = StagedDocument::new(HistoryDocument::new("r"));
        staged.apply(ok, |doc| doc.insert(&tag("a", 1))).unwrap();
        assert_eq!(staged.current().tags.len(), 1);
    }

    #[test]
    fn failed_persist_keeps_committed_state() {
        let mut staged = StagedDocument::new(HistoryDocument::new("r"));
        let result = staged.apply(
            |_| Err(HistoryError::Store("disk full".to_string())),
            |doc| doc.insert(&tag("a", 1)),
        );
        assert!(result.is_err());
        assert!(staged.current().tags.is_empty());
    }

    #[test]
    fn abort_discards_working_copy() {
        let mut staged = StagedDocument::new(HistoryDocument::new("r"));
        staged.begin().unwrap();
        staged.apply(ok, |doc| doc.insert(&tag("a", 1))).unwrap();
        assert_eq!(staged.current().tags.len(), 1);
        staged.abort().unwrap();
        assert!(staged.current().tags.is_empty());
    }

    #[test]
    fn nested_begin_and_stray_commit_fail() {
        let mut staged = StagedDocument::new(HistoryDocument::new("r"));
        assert!(staged.commit(ok).is_err());
        staged.begin().unwrap();
        assert!(staged.begin().is_err());
        staged.commit(ok).unwrap();
        assert!(!staged.in_transaction());
    }
}
