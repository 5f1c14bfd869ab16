use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::catalog::{CatalogEntry, CatalogLink, CatalogSource};
use crate::fetcher::error::FetcherConfigError;
use crate::fetcher::registry::FetcherRegistry;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default window every entry is checked once in (1 hour)
pub const DEFAULT_CHECK_DISTRIBUTION: Duration = Duration::from_secs(60 * 60);

/// Interval the scheduler wakes up at to look for due entries (1 minute)
pub const SCHEDULER_TICK: Duration = Duration::from_secs(60);

/// Timeout for GitHub API requests (2 seconds)
pub const GITHUB_HTTP_TIMEOUT: Duration = Duration::from_secs(2);

/// Number of change log rows printed when no limit is given
pub const DEFAULT_LOG_LIMIT: usize = 20;

pub const USER_AGENT: &str = concat!("latestver/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("catalog entry {index} ({key}) has unknown fetcher {fetcher:?}")]
    UnknownFetcher {
        index: usize,
        key: String,
        fetcher: String,
    },

    #[error("catalog entry {index} ({key}) has invalid fetcher config: {source}")]
    InvalidFetcherConfig {
        index: usize,
        key: String,
        source: FetcherConfigError,
    },

    #[error("catalog entry {0} is defined more than once")]
    DuplicateEntry(String),

    #[error("catalog entry {0} not found")]
    EntryNotFound(String),
}

/// Contents of the YAML configuration file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,

    /// Check distribution used when none is given on the command line
    #[serde(default = "default_check_interval", with = "humantime_serde")]
    pub check_interval: Duration,
}

fn default_check_interval() -> Duration {
    DEFAULT_CHECK_DISTRIBUTION
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            catalog: Vec::new(),
            check_interval: DEFAULT_CHECK_DISTRIBUTION,
        }
    }
}

impl ConfigFile {
    /// Reads and parses the file at `path`. Fetcher configs are not checked
    /// here; call [`ConfigFile::validate_catalog`] for that.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Checks that every entry names a registered fetcher whose config is
    /// valid, and that no (name, tag) pair appears twice
    pub fn validate_catalog(&self, registry: &FetcherRegistry) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for (index, entry) in self.catalog.iter().enumerate() {
            let key = entry.key();

            let fetcher = registry
                .get(&entry.fetcher)
                .ok_or_else(|| ConfigError::UnknownFetcher {
                    index,
                    key: key.clone(),
                    fetcher: entry.fetcher.clone(),
                })?;

            fetcher
                .validate(&entry.fetcher_config)
                .map_err(|source| ConfigError::InvalidFetcherConfig {
                    index,
                    key: key.clone(),
                    source,
                })?;

            if !seen.insert(key.clone()) {
                return Err(ConfigError::DuplicateEntry(key));
            }
        }

        Ok(())
    }

    pub fn catalog_entry_by_tag(&self, name: &str, tag: &str) -> Result<&CatalogEntry, ConfigError> {
        self.catalog
            .iter()
            .find(|entry| entry.name == name && entry.tag == tag)
            .ok_or_else(|| ConfigError::EntryNotFound(crate::catalog::entry_key(name, tag)))
    }

    /// Links of an entry: the fetcher's own links followed by the configured ones
    pub fn links(&self, entry: &CatalogEntry, registry: &FetcherRegistry) -> Vec<CatalogLink> {
        let mut links = registry
            .get(&entry.fetcher)
            .map(|fetcher| fetcher.links(&entry.fetcher_config))
            .unwrap_or_default();
        links.extend(entry.links.iter().cloned());
        links
    }
}

impl CatalogSource for ConfigFile {
    fn snapshot(&self) -> Vec<CatalogEntry> {
        self.catalog.clone()
    }
}

/// Returns the path to the data directory for latestver.
/// Uses $XDG_DATA_HOME/latestver if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/latestver,
/// or ./latestver if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the database file.
pub fn db_path() -> PathBuf {
    data_dir().join("latestver.db")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("latestver")
}
