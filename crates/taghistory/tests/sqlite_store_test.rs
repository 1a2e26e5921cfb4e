mod common;

use common::{
    assert_same_tags, check_crud, check_transactions, edge_list, hash, sample_list, tag, FQRN,
};
use rusqlite::Connection;
use taghistory::store::sqlite::SqliteStore;
use taghistory::{HistoryError, TagList, TagStore, UpdateChannel};
use tempfile::TempDir;

fn setup() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.db");
    (dir, path)
}

#[test]
fn test_sqlite_crud() {
    let (_dir, path) = setup();
    let mut store = SqliteStore::create(&path, FQRN).unwrap();
    check_crud(&mut store);
}

#[test]
fn test_sqlite_transactions() {
    let (_dir, path) = setup();
    let mut store = SqliteStore::create(&path, FQRN).unwrap();
    check_transactions(&mut store);
}

#[test]
fn test_sqlite_create_refuses_existing_file() {
    let (_dir, path) = setup();
    SqliteStore::create(&path, FQRN).unwrap();
    assert!(SqliteStore::create(&path, FQRN).is_err());
}

#[test]
fn test_sqlite_open_missing_file_fails() {
    let (_dir, path) = setup();
    assert!(SqliteStore::open(&path).is_err());
    assert!(SqliteStore::open_writable(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn test_sqlite_round_trip_through_reopen() {
    let (_dir, path) = setup();
    let original = sample_list();
    {
        let mut store = SqliteStore::create(&path, FQRN).unwrap();
        store.begin_transaction().unwrap();
        original.store(&mut store).unwrap();
        store.set_previous_revision(&hash(0x42)).unwrap();
        store.commit_transaction().unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert!(!store.is_writable());
    assert_eq!(store.fqrn(), FQRN);
    assert_eq!(store.number_of_tags().unwrap(), original.len());
    assert_eq!(store.previous_revision().unwrap(), Some(hash(0x42)));

    let mut loaded = TagList::new();
    loaded.load(&store).unwrap();
    assert_same_tags(&loaded, &original);
}

#[test]
fn test_sqlite_round_trip_keeps_edge_values() {
    let (_dir, path) = setup();
    let original = edge_list();
    {
        let mut store = SqliteStore::create(&path, FQRN).unwrap();
        store.begin_transaction().unwrap();
        original.store(&mut store).unwrap();
        store.commit_transaction().unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let mut loaded = TagList::new();
    loaded.load(&store).unwrap();
    assert_same_tags(&loaded, &original);
    assert_eq!(loaded.find_tag("huge").unwrap().size, u64::MAX);
    assert_eq!(
        loaded.find_tag("fractional").unwrap().timestamp().timestamp(),
        1_700_000_000
    );
}

#[test]
fn test_sqlite_read_only_rejects_writes() {
    let (_dir, path) = setup();
    SqliteStore::create(&path, FQRN).unwrap();
    let mut store = SqliteStore::open(&path).unwrap();
    assert!(matches!(
        store.insert(&tag("v1", 1, UpdateChannel::Trunk)),
        Err(HistoryError::ReadOnly)
    ));
    assert!(matches!(store.remove("v1"), Err(HistoryError::ReadOnly)));
    assert!(matches!(
        store.set_previous_revision(&hash(1)),
        Err(HistoryError::ReadOnly)
    ));
}

#[test]
fn test_sqlite_uncommitted_changes_invisible_to_readers() {
    let (_dir, path) = setup();
    let mut writer = SqliteStore::create(&path, FQRN).unwrap();
    writer.insert(&tag("v1", 1, UpdateChannel::Trunk)).unwrap();

    writer.begin_transaction().unwrap();
    writer.insert(&tag("v2", 2, UpdateChannel::Trunk)).unwrap();

    let reader = SqliteStore::open(&path).unwrap();
    assert_eq!(reader.number_of_tags().unwrap(), 1);

    writer.commit_transaction().unwrap();
    assert_eq!(reader.number_of_tags().unwrap(), 2);
}

#[test]
fn test_sqlite_channel_ids_persisted_as_integers() {
    let (_dir, path) = setup();
    let mut store = SqliteStore::create(&path, FQRN).unwrap();
    for (i, channel) in UpdateChannel::ALL.into_iter().enumerate() {
        store
            .insert(&tag(&format!("t{}", i), i as u32 + 1, channel))
            .unwrap();
    }
    drop(store);

    let conn = Connection::open(&path).unwrap();
    let mut stmt = conn
        .prepare("SELECT channel FROM tags ORDER BY revision")
        .unwrap();
    let ids: Vec<i64> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(ids, vec![0, 4, 16, 64]);
}

#[test]
fn test_sqlite_schema_mismatch() {
    let (_dir, path) = setup();
    SqliteStore::create(&path, FQRN).unwrap();
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute("UPDATE properties SET value = '0.1' WHERE key = 'schema'", [])
            .unwrap();
    }
    assert!(matches!(
        SqliteStore::open(&path),
        Err(HistoryError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_sqlite_missing_properties_table_is_schema_mismatch() {
    let (_dir, path) = setup();
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute("CREATE TABLE unrelated (id INTEGER PRIMARY KEY)", [])
            .unwrap();
    }
    assert!(matches!(
        SqliteStore::open(&path),
        Err(HistoryError::SchemaMismatch { ref found, .. }) if found == "none"
    ));
    assert!(matches!(
        SqliteStore::open_writable(&path),
        Err(HistoryError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_sqlite_unknown_channel_is_corruption() {
    let (_dir, path) = setup();
    let mut store = SqliteStore::create(&path, FQRN).unwrap();
    store.insert(&tag("v1", 1, UpdateChannel::Trunk)).unwrap();
    drop(store);
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute("UPDATE tags SET channel = 5", []).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let mut list = TagList::new();
    assert!(list.load(&store).is_err());
    assert!(list.is_empty());
}
