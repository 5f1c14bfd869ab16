use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("stored timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error("creating database directory: {0}")]
    Io(#[from] std::io::Error),
}
