//! Store test utilities

use std::sync::Arc;

use tempfile::TempDir;

use latestver::store::SqliteStore;

/// Opens a fresh SQLite store inside a temporary directory
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn create_test_store() -> (TempDir, Arc<SqliteStore>) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteStore::open(&db_path).unwrap();

    (temp_dir, Arc::new(store))
}
