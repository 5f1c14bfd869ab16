use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::entry_key;

/// Current state of one catalog entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogMeta {
    pub catalog_name: String,
    pub catalog_tag: String,
    /// Last version accepted for this entry; empty before the first success
    pub current_version: String,
    /// Text of the last fetch or compare failure; empty when healthy
    pub error: String,
    pub last_checked: Option<DateTime<Utc>>,
    /// When the current version was published or observed upstream
    pub version_time: Option<DateTime<Utc>>,
}

impl CatalogMeta {
    /// Meta of an entry that has never been checked
    pub fn empty(name: &str, tag: &str) -> Self {
        Self {
            catalog_name: name.to_string(),
            catalog_tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> String {
        entry_key(&self.catalog_name, &self.catalog_tag)
    }
}

/// One accepted version transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub catalog_name: String,
    pub catalog_tag: String,
    /// Detection time, not the upstream publish time
    pub timestamp: DateTime<Utc>,
    pub version_from: String,
    pub version_to: String,
}

/// Paged, optionally filtered listing of log entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Restrict to one (name, tag) entry
    pub entry: Option<(String, String)>,
    /// Maximum rows; 0 means unlimited
    pub limit: usize,
    pub offset: usize,
}

impl LogQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn for_entry(mut self, name: &str, tag: &str) -> Self {
        self.entry = Some((name.to_string(), tag.to_string()));
        self
    }

    /// Selects the zero-based page of `limit` rows
    pub fn page(mut self, page: usize) -> Self {
        self.offset = self.limit.saturating_mul(page);
        self
    }
}
