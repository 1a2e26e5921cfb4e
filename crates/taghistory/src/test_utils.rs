use crate::hash::{RootHash, DIGEST_LEN};
use crate::model::{Tag, UpdateChannel};
use chrono::{TimeZone, Utc};

pub const FQRN: &str = "test.example.org";

/// A sha1 root hash with every digest byte set to `byte`.
pub fn hash(byte: u8) -> RootHash {
    RootHash::sha1([byte; DIGEST_LEN])
}

/// Fully specified tag; `hash_byte` fills the root hash digest.
pub fn tag_at(
    name: &str,
    revision: u32,
    timestamp_secs: i64,
    channel: UpdateChannel,
    hash_byte: u8,
) -> Tag {
    let timestamp = Utc
        .timestamp_opt(timestamp_secs, 0)
        .single()
        .unwrap_or_default();
    Tag::new(
        name,
        hash(hash_byte),
        1024,
        revision,
        timestamp,
        channel,
        format!("tag {}", name),
    )
}

/// Trunk tag whose timestamp and hash derive from the revision.
pub fn sample_tag(name: &str, revision: u32) -> Tag {
    tag_at(
        name,
        revision,
        1_700_000_000 + i64::from(revision) * 60,
        UpdateChannel::Trunk,
        revision as u8,
    )
}
