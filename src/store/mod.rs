//! Persistence of per-entry state and the version change log
//!
//! The scheduler only depends on [`MetaStore`]; [`SqliteStore`] is the
//! implementation the binary uses.

pub mod error;
pub mod sqlite;
pub mod types;

#[cfg(test)]
use mockall::automock;

pub use error::StoreError;
pub use sqlite::SqliteStore;
pub use types::{CatalogMeta, LogEntry, LogQuery};

/// Read/write contract of the metadata store
#[cfg_attr(test, automock)]
pub trait MetaStore: Send + Sync + 'static {
    /// Returns the stored meta, or an empty one if the entry was never checked
    fn get_meta(&self, name: &str, tag: &str) -> Result<CatalogMeta, StoreError>;

    /// Inserts or replaces the meta keyed by (name, tag)
    fn put_meta(&self, meta: &CatalogMeta) -> Result<(), StoreError>;

    /// Appends a change log row
    fn add_log(&self, entry: &LogEntry) -> Result<(), StoreError>;

    /// Appends the log row of an accepted change and upserts the meta
    /// carrying the new version, both or neither
    fn record_change(&self, meta: &CatalogMeta, entry: &LogEntry) -> Result<(), StoreError>;

    /// Log rows newest first
    fn list_logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>, StoreError>;
}
