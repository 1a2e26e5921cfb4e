//! # Tag List
//!
//! [`TagList`] is the in-memory history of a repository: every published tag,
//! with the queries and edits the publish and garbage-collection workflows need.
//! It performs no I/O of its own; [`TagList::load`] and [`TagList::store`] move
//! its whole state across a [`TagStore`].
//!
//! ## Invariants
//!
//! - No two tags share a name.
//! - No two tags share a revision.
//!
//! Only [`TagList::insert`] can introduce a tag, and it rejects both kinds of
//! collision with [`HistoryError::TagExists`]. Removal and rollback can never
//! break uniqueness.
//!
//! ## Canonical Order
//!
//! Tags are kept sorted by **descending revision** (newest first). Every query
//! that has to pick among several matches, and every aggregate that returns a
//! sequence, follows this order:
//!
//! - [`TagList::find_hash`] returns the newest tag carrying the hash.
//! - [`TagList::channel_tops`] lists channel heads newest first.
//! - [`TagList::referenced_hashes`] lists hashes newest first, repeats included.
//!
//! ## Channel Heads
//!
//! A channel's head is its highest-revision tag. Heads are derived on demand,
//! never stored, so a rollback cannot leave one pointing at a discarded tag.

use crate::error::{HistoryError, Result};
use crate::hash::RootHash;
use crate::model::{Tag, UpdateChannel};
use crate::store::TagStore;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Head of one update channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTag {
    pub channel: UpdateChannel,
    pub root_hash: RootHash,
}

impl ChannelTag {
    pub fn new(channel: UpdateChannel, root_hash: RootHash) -> Self {
        Self { channel, root_hash }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagList {
    // Sorted by descending revision.
    list: Vec<Tag>,
}

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from arbitrary tags, failing on the first collision.
    pub fn from_tags(tags: impl IntoIterator<Item = Tag>) -> Result<Self> {
        let mut list = Self::new();
        for tag in tags {
            list.insert(tag)?;
        }
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Tags newest first.
    pub fn tags(&self) -> &[Tag] {
        &self.list
    }

    pub fn head(&self) -> Option<&Tag> {
        self.list.first()
    }

    pub fn find_tag(&self, name: &str) -> Option<&Tag> {
        self.list.iter().find(|t| t.name == name)
    }

    /// The tag that was current at `time`: greatest timestamp not after it.
    /// Equal timestamps resolve to the higher revision.
    pub fn find_tag_by_date(&self, time: DateTime<Utc>) -> Option<&Tag> {
        self.list
            .iter()
            .filter(|t| t.timestamp() <= time)
            .max_by(|a, b| {
                a.timestamp()
                    .cmp(&b.timestamp())
                    .then(a.revision.cmp(&b.revision))
            })
    }

    pub fn find_revision(&self, revision: u32) -> Option<&Tag> {
        self.list
            .binary_search_by(|t| revision.cmp(&t.revision))
            .ok()
            .map(|i| &self.list[i])
    }

    /// First tag in canonical order (newest first) whose root hash matches.
    /// Hashes may repeat across tags; older matches are never returned.
    pub fn find_hash(&self, hash: &RootHash) -> Option<&Tag> {
        self.list.iter().find(|t| t.root_hash == *hash)
    }

    pub fn insert(&mut self, tag: Tag) -> Result<()> {
        if self
            .list
            .iter()
            .any(|t| t.name == tag.name || t.revision == tag.revision)
        {
            return Err(HistoryError::TagExists {
                name: tag.name,
                revision: tag.revision,
            });
        }
        let pos = self.list.partition_point(|t| t.revision > tag.revision);
        self.list.insert(pos, tag);
        Ok(())
    }

    /// Removes the named tag. Unknown names are ignored.
    pub fn remove(&mut self, name: &str) {
        self.list.retain(|t| t.name != name);
    }

    /// Discards every tag newer than `until_revision` and returns them,
    /// newest first. Tags at or below the cutoff are untouched.
    pub fn rollback(&mut self, until_revision: u32) -> Vec<Tag> {
        let split = self.list.partition_point(|t| t.revision > until_revision);
        self.list.drain(..split).collect()
    }

    /// Head of every channel that has at least one tag, newest release first.
    pub fn channel_tops(&self) -> Vec<ChannelTag> {
        let mut seen = HashSet::new();
        self.list
            .iter()
            .filter(|t| seen.insert(t.channel))
            .map(|t| ChannelTag::new(t.channel, t.root_hash))
            .collect()
    }

    /// Human-readable table of all tags, newest first.
    pub fn list(&self) -> String {
        let mut out = String::new();
        for tag in &self.list {
            out.push_str(&format!(
                "{} \t{} \t{} \t{} \t{} \t{} \t{}\n",
                tag.name,
                tag.root_hash,
                tag.size,
                tag.revision,
                tag.timestamp().format("%d %b %Y %H:%M:%S UTC"),
                tag.channel_name(),
                tag.description
            ));
        }
        out
    }

    pub fn all_hashes(&self) -> BTreeMap<String, RootHash> {
        self.list
            .iter()
            .map(|t| (t.name.clone(), t.root_hash))
            .collect()
    }

    /// Every root hash referenced by a tag, ordered from HEAD to tail.
    ///
    /// This is the live set for garbage collection: repeated hashes are kept
    /// so the result lines up one-to-one with the tags.
    pub fn referenced_hashes(&self) -> Vec<RootHash> {
        self.list.iter().map(|t| t.root_hash).collect()
    }

    /// Replaces this list with the tags held by `store`.
    ///
    /// Nothing changes unless the whole store reads back cleanly and satisfies
    /// the uniqueness invariants.
    pub fn load<S: TagStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let tags = store.list()?;
        let loaded = Self::from_tags(tags).map_err(|e| match e {
            HistoryError::TagExists { name, revision } => HistoryError::Corrupt(format!(
                "store holds colliding tag '{}' (revision {})",
                name, revision
            )),
            other => other,
        })?;
        debug!(fqrn = store.fqrn(), tags = loaded.len(), "loaded tag list");
        *self = loaded;
        Ok(())
    }

    /// Writes this list into `store`, replacing the tags held there.
    ///
    /// Runs inside the caller's transaction; on error the caller aborts it.
    pub fn store<S: TagStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        for existing in store.list()? {
            store.remove(&existing.name)?;
        }
        for tag in self.list.iter().rev() {
            store.insert(tag)?;
        }
        debug!(fqrn = store.fqrn(), tags = self.len(), "stored tag list");
        Ok(())
    }
}
