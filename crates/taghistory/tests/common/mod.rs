#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use taghistory::hash::{RootHash, DIGEST_LEN};
use taghistory::{HistoryError, Tag, TagList, TagStore, UpdateChannel};

pub const FQRN: &str = "atlas.example.org";

pub fn hash(byte: u8) -> RootHash {
    RootHash::sha1([byte; DIGEST_LEN])
}

pub fn tag(name: &str, revision: u32, channel: UpdateChannel) -> Tag {
    Tag::new(
        name,
        hash(revision as u8),
        4096 + u64::from(revision),
        revision,
        Utc.timestamp_opt(1_600_000_000 + i64::from(revision) * 3600, 0)
            .unwrap(),
        channel,
        format!("published {}", name),
    )
}

/// Tags at the edges of their field ranges: a sub-second publish time and
/// the largest representable size.
pub fn edge_list() -> TagList {
    TagList::from_tags([
        Tag::new(
            "fractional",
            hash(1),
            0,
            1,
            Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap(),
            UpdateChannel::Trunk,
            "",
        ),
        Tag::new(
            "huge",
            hash(2),
            u64::MAX,
            2,
            Utc.timestamp_opt(1_700_000_060, 0).unwrap(),
            UpdateChannel::Prod,
            "",
        ),
    ])
    .unwrap()
}

pub fn sample_list() -> TagList {
    TagList::from_tags([
        tag("trunk-1", 1, UpdateChannel::Trunk),
        tag("devel-2", 2, UpdateChannel::Devel),
        tag("test-3", 3, UpdateChannel::Test),
        tag("prod-4", 4, UpdateChannel::Prod),
        tag("trunk-5", 5, UpdateChannel::Trunk),
    ])
    .unwrap()
}

pub fn assert_same_tags(a: &TagList, b: &TagList) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.tags().iter().zip(b.tags()) {
        assert!(x.same_fields(y), "{:?} != {:?}", x, y);
    }
}

/// Behaviour every writable backend must share.
pub fn check_crud<S: TagStore>(store: &mut S) {
    assert!(store.is_writable());
    assert_eq!(store.fqrn(), FQRN);
    assert_eq!(store.number_of_tags().unwrap(), 0);

    let t = tag("v1", 1, UpdateChannel::Prod);
    store.insert(&t).unwrap();
    assert!(store.exists("v1").unwrap());
    assert!(store.get("v1").unwrap().unwrap().same_fields(&t));
    assert!(store.get("v2").unwrap().is_none());

    assert!(matches!(
        store.insert(&tag("v1", 2, UpdateChannel::Trunk)),
        Err(HistoryError::TagExists { .. })
    ));
    assert!(matches!(
        store.insert(&tag("other", 1, UpdateChannel::Trunk)),
        Err(HistoryError::TagExists { .. })
    ));
    assert_eq!(store.number_of_tags().unwrap(), 1);

    store.insert(&tag("v3", 3, UpdateChannel::Trunk)).unwrap();
    store.insert(&tag("v2", 2, UpdateChannel::Devel)).unwrap();
    let revisions: Vec<u32> = store.list().unwrap().iter().map(|t| t.revision).collect();
    assert_eq!(revisions, vec![3, 2, 1]);

    store.remove("v2").unwrap();
    store.remove("v2").unwrap();
    assert_eq!(store.number_of_tags().unwrap(), 2);
}

pub fn check_transactions<S: TagStore>(store: &mut S) {
    assert!(matches!(
        store.commit_transaction(),
        Err(HistoryError::Transaction(_))
    ));

    store.begin_transaction().unwrap();
    assert!(store.in_transaction());
    assert!(matches!(
        store.begin_transaction(),
        Err(HistoryError::Transaction(_))
    ));
    store.insert(&tag("staged", 10, UpdateChannel::Trunk)).unwrap();
    assert!(store.exists("staged").unwrap());
    store.abort_transaction().unwrap();
    assert!(!store.in_transaction());
    assert!(!store.exists("staged").unwrap());

    store.begin_transaction().unwrap();
    store.insert(&tag("kept", 11, UpdateChannel::Trunk)).unwrap();
    store.set_previous_revision(&hash(0xaa)).unwrap();
    store.commit_transaction().unwrap();
    assert!(store.exists("kept").unwrap());
    assert_eq!(store.previous_revision().unwrap(), Some(hash(0xaa)));
}
