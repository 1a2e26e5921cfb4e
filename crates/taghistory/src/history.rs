//! # History Facade
//!
//! [`History`] is the entry point for workflows that change a repository's
//! tag history. It owns a [`TagStore`] and runs every change as one
//! load–mutate–store cycle inside a single transaction:
//!
//! ```text
//! begin ─► TagList::load ─► mutate in memory ─► TagList::store ─► commit
//!                                   │
//!                                error ─► abort (store unchanged)
//! ```
//!
//! An external observer therefore sees either the history before the call or
//! after it, never a rollback without the tag that followed it.
//!
//! Read-only queries load a [`TagList`] without opening a transaction.
//!
//! ## Generic Over TagStore
//!
//! - Production: `History<SqliteStore>`, `History<JsonStore>`, or
//!   `History<Box<dyn TagStore>>` when the backend is chosen at runtime.
//! - Testing: `History<MemoryStore>`.

use crate::error::{HistoryError, Result};
use crate::hash::RootHash;
use crate::model::Tag;
use crate::store::TagStore;
use crate::tag_list::{ChannelTag, TagList};
use tracing::{info, warn};

pub struct History<S: TagStore> {
    store: S,
}

impl<S: TagStore> History<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn fqrn(&self) -> &str {
        self.store.fqrn()
    }

    pub fn tags(&self) -> Result<TagList> {
        let mut list = TagList::new();
        list.load(&self.store)?;
        Ok(list)
    }

    /// One past the newest revision, or 1 for an empty history.
    pub fn next_revision(&self) -> Result<u32> {
        match self.tags()?.head() {
            None => Ok(1),
            Some(head) => head
                .revision
                .checked_add(1)
                .ok_or_else(|| HistoryError::Store("revision space exhausted".to_string())),
        }
    }

    pub fn previous_revision(&self) -> Result<Option<RootHash>> {
        self.store.previous_revision()
    }

    pub fn referenced_hashes(&self) -> Result<Vec<RootHash>> {
        Ok(self.tags()?.referenced_hashes())
    }

    pub fn channel_tops(&self) -> Result<Vec<ChannelTag>> {
        Ok(self.tags()?.channel_tops())
    }

    pub fn add_tag(&mut self, tag: Tag) -> Result<()> {
        let (name, revision) = (tag.name.clone(), tag.revision);
        self.edit(|list| list.insert(tag))?;
        info!(fqrn = self.fqrn(), tag = %name, revision, "added tag");
        Ok(())
    }

    /// Removes the named tags and returns the names that were present.
    pub fn remove_tags<N: AsRef<str>>(&mut self, names: &[N]) -> Result<Vec<String>> {
        let removed = self.edit(|list| {
            let mut removed = Vec::new();
            for name in names {
                let name = name.as_ref();
                if list.find_tag(name).is_some() {
                    list.remove(name);
                    removed.push(name.to_string());
                }
            }
            Ok(removed)
        })?;
        info!(fqrn = self.fqrn(), removed = removed.len(), "removed tags");
        Ok(removed)
    }

    /// Discards every tag newer than `until_revision`; returns them newest first.
    pub fn rollback(&mut self, until_revision: u32) -> Result<Vec<Tag>> {
        let dropped = self.edit(|list| Ok(list.rollback(until_revision)))?;
        info!(
            fqrn = self.fqrn(),
            until_revision,
            dropped = dropped.len(),
            "rolled back history"
        );
        Ok(dropped)
    }

    /// Rolls back to the revision of the named tag. `None` if no such tag.
    pub fn rollback_to(&mut self, name: &str) -> Result<Option<Vec<Tag>>> {
        let Some(revision) = self.tags()?.find_tag(name).map(|t| t.revision) else {
            return Ok(None);
        };
        self.rollback(revision).map(Some)
    }

    pub fn set_previous_revision(&mut self, hash: &RootHash) -> Result<()> {
        self.transaction(|store| store.set_previous_revision(hash))?;
        info!(fqrn = self.fqrn(), previous = %hash, "linked previous history revision");
        Ok(())
    }

    fn edit<T>(&mut self, change: impl FnOnce(&mut TagList) -> Result<T>) -> Result<T> {
        self.transaction(|store| {
            let mut list = TagList::new();
            list.load(&*store)?;
            let out = change(&mut list)?;
            list.store(store)?;
            Ok(out)
        })
    }

    fn transaction<T>(&mut self, work: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        self.store.begin_transaction()?;
        let outcome = work(&mut self.store).and_then(|out| {
            self.store.commit_transaction()?;
            Ok(out)
        });
        if let Err(e) = &outcome {
            warn!(fqrn = self.store.fqrn(), error = %e, "aborting history transaction");
            if self.store.in_transaction() {
                if let Err(abort_err) = self.store.abort_transaction() {
                    warn!(
                        fqrn = self.store.fqrn(),
                        error = %abort_err,
                        "failed to abort history transaction"
                    );
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UpdateChannel;
    use crate::store::memory::MemoryStore;
    use crate::test_utils::{hash, sample_tag, tag_at, FQRN};

    fn history_with(revisions: &[u32]) -> History<MemoryStore> {
        let mut history = History::new(MemoryStore::create(FQRN));
        for rev in revisions {
            history
                .add_tag(sample_tag(&format!("r{}", rev), *rev))
                .unwrap();
        }
        history
    }

    #[test]
    fn next_revision_starts_at_one() {
        let history = history_with(&[]);
        assert_eq!(history.next_revision().unwrap(), 1);
        let history = history_with(&[1, 2, 5]);
        assert_eq!(history.next_revision().unwrap(), 6);
    }

    #[test]
    fn next_revision_at_top_of_range_is_an_error() {
        let history = history_with(&[u32::MAX]);
        assert!(matches!(
            history.next_revision(),
            Err(HistoryError::Store(_))
        ));
    }

    #[test]
    fn add_tag_persists() {
        let history = history_with(&[1, 2]);
        assert_eq!(history.store().number_of_tags().unwrap(), 2);
        assert_eq!(history.fqrn(), FQRN);
    }

    #[test]
    fn add_duplicate_leaves_store_unchanged() {
        let mut history = history_with(&[1]);
        let result = history.add_tag(sample_tag("r1", 7));
        assert!(matches!(result, Err(HistoryError::TagExists { .. })));
        assert!(!history.store().in_transaction());
        assert_eq!(history.store().number_of_tags().unwrap(), 1);
        assert_eq!(history.store().get("r1").unwrap().unwrap().revision, 1);
    }

    #[test]
    fn remove_reports_present_names() {
        let mut history = history_with(&[1, 2, 3]);
        let removed = history.remove_tags(&["r2", "nope"]).unwrap();
        assert_eq!(removed, vec!["r2".to_string()]);
        assert!(!history.store().exists("r2").unwrap());
        assert!(history.remove_tags(&["r2"]).unwrap().is_empty());
    }

    #[test]
    fn rollback_then_publish() {
        let mut history = history_with(&[1, 2, 3, 4]);
        let dropped = history.rollback(2).unwrap();
        assert_eq!(dropped.len(), 2);
        assert_eq!(history.next_revision().unwrap(), 3);

        history.add_tag(sample_tag("r3-again", 3)).unwrap();
        let revisions: Vec<u32> = history
            .tags()
            .unwrap()
            .tags()
            .iter()
            .map(|t| t.revision)
            .collect();
        assert_eq!(revisions, vec![3, 2, 1]);
    }

    #[test]
    fn rollback_to_named_tag() {
        let mut history = history_with(&[1, 2, 3]);
        let dropped = history.rollback_to("r1").unwrap().unwrap();
        assert_eq!(dropped.len(), 2);
        assert!(history.rollback_to("missing").unwrap().is_none());
    }

    #[test]
    fn failed_commit_aborts_transaction() {
        let mut history = history_with(&[1]);
        history.store().set_simulate_write_error(true);
        assert!(history.add_tag(sample_tag("r2", 2)).is_err());
        assert!(!history.store().in_transaction());

        history.store().set_simulate_write_error(false);
        assert_eq!(history.tags().unwrap().len(), 1);
    }

    #[test]
    fn failed_abort_keeps_original_error() {
        let mut history = history_with(&[1]);
        history.store().set_simulate_write_error(true);
        history.store().set_simulate_abort_error(true);
        match history.add_tag(sample_tag("r2", 2)) {
            Err(HistoryError::Store(msg)) => assert_eq!(msg, "Simulated write error"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn gc_view_and_channel_heads() {
        let mut history = History::new(MemoryStore::create(FQRN));
        history
            .add_tag(tag_at("p1", 1, 10, UpdateChannel::Prod, 1))
            .unwrap();
        history
            .add_tag(tag_at("t2", 2, 20, UpdateChannel::Test, 2))
            .unwrap();
        history
            .add_tag(tag_at("p3", 3, 30, UpdateChannel::Prod, 3))
            .unwrap();

        assert_eq!(
            history.referenced_hashes().unwrap(),
            vec![hash(3), hash(2), hash(1)]
        );
        let tops = history.channel_tops().unwrap();
        assert_eq!(tops[0], ChannelTag::new(UpdateChannel::Prod, hash(3)));
        assert_eq!(tops[1], ChannelTag::new(UpdateChannel::Test, hash(2)));
    }

    #[test]
    fn previous_revision_link() {
        let mut history = history_with(&[]);
        assert!(history.previous_revision().unwrap().is_none());
        history.set_previous_revision(&hash(9)).unwrap();
        assert_eq!(history.previous_revision().unwrap(), Some(hash(9)));
    }

    #[test]
    fn read_only_history_cannot_be_edited() {
        let mut history = History::new(MemoryStore::read_only(FQRN, &[sample_tag("r1", 1)]));
        assert!(matches!(
            history.add_tag(sample_tag("r2", 2)),
            Err(HistoryError::ReadOnly)
        ));
        assert_eq!(history.tags().unwrap().len(), 1);
    }
}
