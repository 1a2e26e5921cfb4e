use super::{TagStore, FQRN_KEY, PREVIOUS_REVISION_KEY, SCHEMA_KEY, SCHEMA_VERSION};
use crate::error::{HistoryError, Result};
use crate::hash::RootHash;
use crate::model::{timestamp_from_secs, Tag, UpdateChannel};
use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CREATE_SCHEMA: &str = "
    CREATE TABLE tags (
        name TEXT PRIMARY KEY,
        hash TEXT NOT NULL,
        revision INTEGER NOT NULL UNIQUE,
        timestamp INTEGER NOT NULL,
        channel INTEGER NOT NULL,
        description TEXT NOT NULL,
        size INTEGER NOT NULL
    );
    CREATE TABLE properties (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

const TAG_COLUMNS: &str = "name, hash, revision, timestamp, channel, description, size";

/// SQLite-backed tag store.
///
/// Schema:
/// - `tags`: one row per tag, `name` primary key, `revision` unique.
/// - `properties`: `schema`, `fqrn` and the optional `previous_revision`.
///
/// Transactions map onto `BEGIN IMMEDIATE` / `COMMIT` / `ROLLBACK`, so
/// isolation from concurrent readers is SQLite's own.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
    fqrn: String,
    writable: bool,
}

impl SqliteStore {
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
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        let init = conn.execute_batch(CREATE_SCHEMA).and_then(|_| {
            let mut stmt =
                conn.prepare("INSERT INTO properties (key, value) VALUES (?1, ?2)")?;
            stmt.execute(params![SCHEMA_KEY, SCHEMA_VERSION])?;
            stmt.execute(params![FQRN_KEY, fqrn])?;
            Ok(())
        });
        if let Err(e) = init {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e.into());
        }
        conn.execute_batch("COMMIT")?;

        info!(path = %path.display(), fqrn, "created sqlite history");
        Ok(Self {
            conn,
            path,
            fqrn: fqrn.to_string(),
            writable: true,
        })
    }

    fn open_with_mode(path: &Path, writable: bool) -> Result<Self> {
        let flags = if writable {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        } else {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        };
        let conn = Connection::open_with_flags(path, flags)?;
        if writable {
            conn.pragma_update(None, "synchronous", "FULL")?;
        }

        let schema = if has_table(&conn, "properties")? {
            read_property(&conn, SCHEMA_KEY)?
        } else {
            None
        };
        if schema.as_deref() != Some(SCHEMA_VERSION) {
            return Err(HistoryError::SchemaMismatch {
                found: schema.unwrap_or_else(|| "none".to_string()),
                expected: SCHEMA_VERSION.to_string(),
            });
        }
        let fqrn = read_property(&conn, FQRN_KEY)?
            .ok_or_else(|| HistoryError::Corrupt("missing fqrn property".to_string()))?;

        debug!(path = %path.display(), fqrn = %fqrn, writable, "opened sqlite history");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
            fqrn,
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
}

fn has_table(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn
        .prepare_cached("SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")?
        .query_row(params![name], |row| row.get(0))?;
    Ok(count > 0)
}

fn read_property(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .prepare_cached("SELECT value FROM properties WHERE key = ?1")?
        .query_row(params![key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

/// Row as stored, before the hash and channel columns are checked.
struct TagRow {
    name: String,
    hash: String,
    revision: i64,
    timestamp: i64,
    channel: i64,
    description: String,
    size: i64,
}

impl TagRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            hash: row.get(1)?,
            revision: row.get(2)?,
            timestamp: row.get(3)?,
            channel: row.get(4)?,
            description: row.get(5)?,
            size: row.get(6)?,
        })
    }

    fn into_tag(self) -> Result<Tag> {
        let corrupt = |what: &str| HistoryError::Corrupt(format!("tag '{}': {}", self.name, what));
        let root_hash: RootHash = self.hash.parse()?;
        let revision = u32::try_from(self.revision).map_err(|_| corrupt("revision out of range"))?;
        // Sizes above i64::MAX are stored as their two's-complement bit pattern.
        let size = self.size as u64;
        let timestamp = timestamp_from_secs(self.timestamp).ok_or_else(|| corrupt("bad timestamp"))?;
        let channel = u32::try_from(self.channel)
            .map_err(|_| corrupt("bad channel"))
            .and_then(UpdateChannel::try_from)?;
        Ok(Tag::new(
            self.name,
            root_hash,
            size,
            revision,
            timestamp,
            channel,
            self.description,
        ))
    }
}

impl TagStore for SqliteStore {
    fn fqrn(&self) -> &str {
        &self.fqrn
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn number_of_tags(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .prepare_cached("SELECT count(*) FROM tags")?
            .query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn begin_transaction(&mut self) -> Result<()> {
        self.ensure_writable()?;
        if self.in_transaction() {
            return Err(HistoryError::Transaction(
                "a transaction is already active".to_string(),
            ));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<()> {
        if !self.in_transaction() {
            return Err(HistoryError::Transaction(
                "no active transaction".to_string(),
            ));
        }
        self.conn.execute_batch("COMMIT")?;
        debug!(path = %self.path.display(), "committed sqlite history");
        Ok(())
    }

    fn abort_transaction(&mut self) -> Result<()> {
        if !self.in_transaction() {
            return Err(HistoryError::Transaction(
                "no active transaction".to_string(),
            ));
        }
        self.conn.execute_batch("ROLLBACK")?;
        warn!(path = %self.path.display(), "rolled back sqlite transaction");
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn previous_revision(&self) -> Result<Option<RootHash>> {
        read_property(&self.conn, PREVIOUS_REVISION_KEY)?
            .map(|value| value.parse::<RootHash>())
            .transpose()
    }

    fn set_previous_revision(&mut self, hash: &RootHash) -> Result<()> {
        self.ensure_writable()?;
        self.conn
            .prepare_cached("INSERT OR REPLACE INTO properties (key, value) VALUES (?1, ?2)")?
            .execute(params![PREVIOUS_REVISION_KEY, hash.to_string()])?;
        Ok(())
    }

    fn insert(&mut self, tag: &Tag) -> Result<()> {
        self.ensure_writable()?;
        let size = tag.size as i64;
        let result = self
            .conn
            .prepare_cached(&format!(
                "INSERT INTO tags ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                TAG_COLUMNS
            ))?
            .execute(params![
                tag.name,
                tag.root_hash.to_string(),
                tag.revision,
                tag.timestamp().timestamp(),
                tag.channel.as_id(),
                tag.description,
                size,
            ]);
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(HistoryError::TagExists {
                    name: tag.name.clone(),
                    revision: tag.revision,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        self.ensure_writable()?;
        self.conn
            .prepare_cached("DELETE FROM tags WHERE name = ?1")?
            .execute(params![name])?;
        Ok(())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    fn get(&self, name: &str) -> Result<Option<Tag>> {
        let row = self
            .conn
            .prepare_cached(&format!("SELECT {} FROM tags WHERE name = ?1", TAG_COLUMNS))?
            .query_row(params![name], TagRow::from_row)
            .optional()?;
        row.map(TagRow::into_tag).transpose()
    }

    fn list(&self) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {} FROM tags ORDER BY revision DESC",
            TAG_COLUMNS
        ))?;
        let rows = stmt.query_map([], TagRow::from_row)?;
        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?.into_tag()?);
        }
        Ok(tags)
    }
}
