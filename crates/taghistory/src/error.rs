use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Tag exists: '{name}' or revision {revision} is already taken")]
    TagExists { name: String, revision: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Schema mismatch: found {found}, expected {expected}")]
    SchemaMismatch { found: String, expected: String },

    #[error("Store is opened read-only")]
    ReadOnly,

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Corrupt history: {0}")]
    Corrupt(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
