//! # Domain Model: Tags and Update Channels
//!
//! A [`Tag`] is a named pointer to one published revision of a repository's
//! filesystem tree. Tags are grouped into [`UpdateChannel`]s so that clients can
//! follow "the latest production snapshot" without pinning a revision.
//!
//! ## Identity
//!
//! Two tags compare equal when they carry the same **revision**, and order by
//! revision alone. Names are the external lookup key, but the revision is what
//! sorts and deduplicates history. Use [`Tag::same_fields`] when every field
//! matters (e.g. verifying a persisted copy).
//!
//! ## Channel Identifiers
//!
//! Channel ids are sparse (`0, 4, 16, 64`) so that finer-grained channels can
//! be slotted in later. The numbers are persisted as-is and are read by
//! external tooling, so they must never be renumbered.

use crate::error::HistoryError;
use crate::hash::RootHash;
use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(into = "u32", try_from = "u32")]
#[repr(u32)]
pub enum UpdateChannel {
    #[default]
    Trunk = 0,
    Devel = 4,
    Test = 16,
    Prod = 64,
}

impl UpdateChannel {
    pub const ALL: [UpdateChannel; 4] = [
        UpdateChannel::Trunk,
        UpdateChannel::Devel,
        UpdateChannel::Test,
        UpdateChannel::Prod,
    ];

    pub fn as_id(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            UpdateChannel::Trunk => "trunk",
            UpdateChannel::Devel => "development",
            UpdateChannel::Test => "testing",
            UpdateChannel::Prod => "production",
        }
    }
}

impl From<UpdateChannel> for u32 {
    fn from(channel: UpdateChannel) -> u32 {
        channel.as_id()
    }
}

impl TryFrom<u32> for UpdateChannel {
    type Error = HistoryError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        UpdateChannel::ALL
            .into_iter()
            .find(|c| c.as_id() == id)
            .ok_or_else(|| HistoryError::InvalidChannel(format!("unknown channel id {}", id)))
    }
}

impl fmt::Display for UpdateChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UpdateChannel {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trunk" => Ok(UpdateChannel::Trunk),
            "devel" | "development" => Ok(UpdateChannel::Devel),
            "test" | "testing" => Ok(UpdateChannel::Test),
            "prod" | "production" => Ok(UpdateChannel::Prod),
            other => Err(HistoryError::InvalidChannel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub root_hash: RootHash,
    pub size: u64,
    pub revision: u32,
    // Whole seconds only; every backend persists epoch seconds.
    #[serde(with = "chrono::serde::ts_seconds")]
    timestamp: DateTime<Utc>,
    pub channel: UpdateChannel,
    #[serde(default)]
    pub description: String,
}

impl Tag {
    /// Builds a tag. Sub-second precision in `timestamp` is dropped.
    pub fn new(
        name: impl Into<String>,
        root_hash: RootHash,
        size: u64,
        revision: u32,
        timestamp: DateTime<Utc>,
        channel: UpdateChannel,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            root_hash,
            size,
            revision,
            timestamp: timestamp.trunc_subsecs(0),
            channel,
            description: description.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn channel_name(&self) -> &'static str {
        self.channel.name()
    }

    /// Structural equality over every field, unlike `==` which only looks at
    /// the revision.
    pub fn same_fields(&self, other: &Tag) -> bool {
        self.name == other.name
            && self.root_hash == other.root_hash
            && self.size == other.size
            && self.revision == other.revision
            && self.timestamp == other.timestamp
            && self.channel == other.channel
            && self.description == other.description
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.revision == other.revision
    }
}

impl Eq for Tag {}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.revision.cmp(&other.revision)
    }
}

/// Converts stored epoch seconds back into a UTC timestamp.
pub fn timestamp_from_secs(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}
