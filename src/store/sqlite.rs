use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::store::error::StoreError;
use crate::store::types::{CatalogMeta, LogEntry, LogQuery};
use crate::store::MetaStore;

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: per-entry log lookups
    &["CREATE INDEX IF NOT EXISTS idx_logs_entry ON logs(catalog_name, catalog_tag)"],
];

const LOG_COLUMNS: &str = "catalog_name, catalog_tag, timestamp, version_from, version_to";
const META_COLUMNS: &str =
    "catalog_name, catalog_tag, current_version, error, last_checked, version_time";

/// Counts of rows copied by [`SqliteStore::migrate_into`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub metas: usize,
    pub logs: usize,
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Raw log row before timestamp conversion
type LogRow = (String, String, i64, String, String);

/// Raw meta row before timestamp conversion
type MetaRow = (String, String, String, String, Option<i64>, Option<i64>);

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        info!("Initializing store database at {:?}", db_path);

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!("Database connection established");

        let store = Self {
            conn: Mutex::new(conn),
        };

        store.create_schema()?;
        info!("Store initialized successfully");

        Ok(store)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS metas (
                catalog_name TEXT NOT NULL,
                catalog_tag TEXT NOT NULL,
                current_version TEXT NOT NULL DEFAULT '',
                error TEXT NOT NULL DEFAULT '',
                last_checked INTEGER,
                version_time INTEGER,
                PRIMARY KEY (catalog_name, catalog_tag)
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                catalog_name TEXT NOT NULL,
                catalog_tag TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                version_from TEXT NOT NULL,
                version_to TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp)",
            [],
        )?;

        Self::apply_migrations(&conn)?;

        debug!("Database schema created successfully");
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), StoreError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    conn.execute(sql, [])?;
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
            debug!("Updated schema version to v{}", target_version);
        }

        Ok(())
    }

    fn upsert_meta(conn: &Connection, meta: &CatalogMeta) -> Result<(), StoreError> {
        conn.execute(
            r#"
            INSERT INTO metas (catalog_name, catalog_tag, current_version, error, last_checked, version_time)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(catalog_name, catalog_tag) DO UPDATE SET
                current_version = excluded.current_version,
                error = excluded.error,
                last_checked = excluded.last_checked,
                version_time = excluded.version_time
            "#,
            (
                &meta.catalog_name,
                &meta.catalog_tag,
                &meta.current_version,
                &meta.error,
                meta.last_checked.map(|t| t.timestamp()),
                meta.version_time.map(|t| t.timestamp()),
            ),
        )?;
        Ok(())
    }

    fn insert_log(conn: &Connection, entry: &LogEntry) -> Result<(), StoreError> {
        conn.execute(
            r#"
            INSERT INTO logs (catalog_name, catalog_tag, timestamp, version_from, version_to)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            (
                &entry.catalog_name,
                &entry.catalog_tag,
                entry.timestamp.timestamp(),
                &entry.version_from,
                &entry.version_to,
            ),
        )?;
        Ok(())
    }

    fn read_log(row: &Row<'_>) -> rusqlite::Result<LogRow> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    }

    fn read_meta(row: &Row<'_>) -> rusqlite::Result<MetaRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn log_from_row(row: LogRow) -> Result<LogEntry, StoreError> {
        let (catalog_name, catalog_tag, timestamp, version_from, version_to) = row;
        Ok(LogEntry {
            catalog_name,
            catalog_tag,
            timestamp: from_unix(timestamp)?,
            version_from,
            version_to,
        })
    }

    fn meta_from_row(row: MetaRow) -> Result<CatalogMeta, StoreError> {
        let (catalog_name, catalog_tag, current_version, error, last_checked, version_time) = row;
        Ok(CatalogMeta {
            catalog_name,
            catalog_tag,
            current_version,
            error,
            last_checked: last_checked.map(from_unix).transpose()?,
            version_time: version_time.map(from_unix).transpose()?,
        })
    }

    /// Every stored meta, ordered by key
    pub fn all_metas(&self) -> Result<Vec<CatalogMeta>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM metas ORDER BY catalog_name, catalog_tag",
            META_COLUMNS
        ))?;

        let rows = stmt
            .query_map([], Self::read_meta)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::meta_from_row).collect()
    }

    /// Every log row in insertion order
    fn all_logs(&self) -> Result<Vec<LogEntry>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM logs ORDER BY id", LOG_COLUMNS))?;

        let rows = stmt
            .query_map([], Self::read_log)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::log_from_row).collect()
    }

    /// Copies every meta and log row into `dest`
    ///
    /// Metas are upserted, so running the copy twice leaves metas unchanged
    /// but appends the log rows again.
    pub fn migrate_into(&self, dest: &dyn MetaStore) -> Result<MigrationReport, StoreError> {
        let metas = self.all_metas()?;
        let logs = self.all_logs()?;

        for meta in &metas {
            dest.put_meta(meta)?;
        }
        for log in &logs {
            dest.add_log(log)?;
        }

        info!("Migrated {} metas and {} log entries", metas.len(), logs.len());
        Ok(MigrationReport {
            metas: metas.len(),
            logs: logs.len(),
        })
    }
}

impl MetaStore for SqliteStore {
    fn get_meta(&self, name: &str, tag: &str) -> Result<CatalogMeta, StoreError> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM metas WHERE catalog_name = ?1 AND catalog_tag = ?2",
                    META_COLUMNS
                ),
                (name, tag),
                Self::read_meta,
            )
            .optional()?;

        match row {
            Some(row) => Self::meta_from_row(row),
            None => Ok(CatalogMeta::empty(name, tag)),
        }
    }

    fn put_meta(&self, meta: &CatalogMeta) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        Self::upsert_meta(&conn, meta)
    }

    fn add_log(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        Self::insert_log(&conn, entry)
    }

    fn record_change(&self, meta: &CatalogMeta, entry: &LogEntry) -> Result<(), StoreError> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        Self::insert_log(&tx, entry)?;
        Self::upsert_meta(&tx, meta)?;
        tx.commit()?;
        Ok(())
    }

    fn list_logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>, StoreError> {
        let (name, tag) = match &query.entry {
            Some((name, tag)) => (Some(name.as_str()), Some(tag.as_str())),
            None => (None, None),
        };
        // SQLite treats a negative LIMIT as unlimited
        let limit = if query.limit == 0 {
            -1
        } else {
            i64::try_from(query.limit).unwrap_or(i64::MAX)
        };
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);

        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM logs
            WHERE ?1 IS NULL OR (catalog_name = ?1 AND catalog_tag = ?2)
            ORDER BY timestamp DESC, id DESC
            LIMIT ?3 OFFSET ?4
            "#,
            LOG_COLUMNS
        ))?;

        let rows = stmt
            .query_map((name, tag, limit, offset), Self::read_log)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::log_from_row).collect()
    }
}

fn from_unix(secs: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp(secs, 0).ok_or(StoreError::InvalidTimestamp(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn open(dir: &TempDir, name: &str) -> SqliteStore {
        SqliteStore::open(&dir.path().join(name)).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn log(name: &str, timestamp: i64, from: &str, to: &str) -> LogEntry {
        LogEntry {
            catalog_name: name.to_string(),
            catalog_tag: "stable".to_string(),
            timestamp: at(timestamp),
            version_from: from.to_string(),
            version_to: to.to_string(),
        }
    }

    fn meta(name: &str, version: &str) -> CatalogMeta {
        CatalogMeta {
            current_version: version.to_string(),
            error: String::new(),
            last_checked: Some(at(1_700_000_000)),
            version_time: Some(at(1_690_000_000)),
            ..CatalogMeta::empty(name, "stable")
        }
    }

    #[test]
    fn get_meta_returns_empty_meta_for_unknown_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir, "test.db");

        assert_eq!(
            store.get_meta("traefik", "stable").unwrap(),
            CatalogMeta::empty("traefik", "stable")
        );
    }

    #[test]
    fn put_meta_upserts() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir, "test.db");

        store.put_meta(&meta("traefik", "3.0.0")).unwrap();
        let mut updated = meta("traefik", "3.1.0");
        updated.error = "network error".to_string();
        updated.version_time = None;
        store.put_meta(&updated).unwrap();

        assert_eq!(store.get_meta("traefik", "stable").unwrap(), updated);
        assert_eq!(store.all_metas().unwrap().len(), 1);
    }

    #[test]
    fn put_meta_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir, "test.db");

        let meta = meta("traefik", "3.0.0");
        store.put_meta(&meta).unwrap();
        store.put_meta(&meta).unwrap();

        assert_eq!(store.all_metas().unwrap(), vec![meta]);
        assert!(store.list_logs(&LogQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn list_logs_orders_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir, "test.db");

        store.add_log(&log("traefik", 100, "1.0", "1.1")).unwrap();
        store.add_log(&log("traefik", 300, "1.2", "1.3")).unwrap();
        store.add_log(&log("traefik", 200, "1.1", "1.2")).unwrap();
        // Same second as the newest row, inserted later
        store.add_log(&log("grafana", 300, "9.0", "9.1")).unwrap();

        let versions: Vec<_> = store
            .list_logs(&LogQuery::default())
            .unwrap()
            .into_iter()
            .map(|l| l.version_to)
            .collect();
        assert_eq!(versions, vec!["9.1", "1.3", "1.2", "1.1"]);
    }

    #[test]
    fn list_logs_filters_and_pages() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir, "test.db");

        for i in 0..5 {
            store
                .add_log(&log("traefik", 100 + i, &format!("1.{}", i), &format!("1.{}", i + 1)))
                .unwrap();
        }
        store.add_log(&log("grafana", 500, "9.0", "9.1")).unwrap();

        let page = |n| {
            store
                .list_logs(&LogQuery::new(2).for_entry("traefik", "stable").page(n))
                .unwrap()
                .into_iter()
                .map(|l| l.version_to)
                .collect::<Vec<_>>()
        };

        assert_eq!(page(0), vec!["1.5", "1.4"]);
        assert_eq!(page(1), vec!["1.3", "1.2"]);
        assert_eq!(page(2), vec!["1.1"]);
        assert!(page(3).is_empty());
    }

    #[test]
    fn data_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = open(&temp_dir, "nested/dir/test.db");
            store.put_meta(&meta("traefik", "3.0.0")).unwrap();
            store.add_log(&log("traefik", 100, "2.0.0", "3.0.0")).unwrap();
        }

        let store = open(&temp_dir, "nested/dir/test.db");
        assert_eq!(store.get_meta("traefik", "stable").unwrap().current_version, "3.0.0");
        assert_eq!(store.list_logs(&LogQuery::default()).unwrap().len(), 1);
    }

    #[test]
    fn migrate_into_copies_metas_and_logs() {
        let temp_dir = TempDir::new().unwrap();
        let source = open(&temp_dir, "source.db");
        let dest = open(&temp_dir, "dest.db");

        source.put_meta(&meta("traefik", "3.0.0")).unwrap();
        source.put_meta(&meta("grafana", "11.0.0")).unwrap();
        source.add_log(&log("traefik", 100, "2.0.0", "3.0.0")).unwrap();

        let report = source.migrate_into(&dest).unwrap();

        assert_eq!(report, MigrationReport { metas: 2, logs: 1 });
        assert_eq!(dest.all_metas().unwrap(), source.all_metas().unwrap());
        assert_eq!(
            dest.list_logs(&LogQuery::default()).unwrap(),
            vec![log("traefik", 100, "2.0.0", "3.0.0")]
        );
    }

    #[test]
    fn record_change_writes_log_and_meta() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir, "test.db");

        store
            .record_change(&meta("traefik", "3.1.0"), &log("traefik", 100, "3.0.0", "3.1.0"))
            .unwrap();

        assert_eq!(store.get_meta("traefik", "stable").unwrap(), meta("traefik", "3.1.0"));
        assert_eq!(
            store.list_logs(&LogQuery::default()).unwrap(),
            vec![log("traefik", 100, "3.0.0", "3.1.0")]
        );
    }

    #[test]
    fn record_change_keeps_no_log_when_meta_write_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir, "test.db");
        store
            .lock_conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_metas BEFORE INSERT ON metas \
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let result =
            store.record_change(&meta("traefik", "3.1.0"), &log("traefik", 100, "3.0.0", "3.1.0"));

        assert!(matches!(result, Err(StoreError::Database(_))));
        assert!(store.list_logs(&LogQuery::default()).unwrap().is_empty());
        assert_eq!(
            store.get_meta("traefik", "stable").unwrap(),
            CatalogMeta::empty("traefik", "stable")
        );
    }

    #[test]
    fn list_logs_with_huge_offset_returns_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir, "test.db");
        store.add_log(&log("traefik", 100, "1.0", "1.1")).unwrap();

        let query = LogQuery {
            offset: usize::MAX,
            ..LogQuery::new(20)
        };

        assert!(store.list_logs(&query).unwrap().is_empty());
        assert!(store.list_logs(&LogQuery::new(20).page(usize::MAX)).unwrap().is_empty());
    }
}
