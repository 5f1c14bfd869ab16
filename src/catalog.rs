//! Catalog entries as read from the configuration file

use serde::{Deserialize, Serialize};

use crate::fetcher::attributes::Attributes;
use crate::version::constraint::Constraint;

/// A monitored (name, tag) pair together with its fetch configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CatalogEntry {
    pub name: String,
    pub tag: String,

    /// Identifier of the fetcher in the [`crate::fetcher::registry::FetcherRegistry`]
    pub fetcher: String,
    #[serde(default)]
    pub fetcher_config: Attributes,

    #[serde(default)]
    pub version_constraint: Option<Constraint>,

    #[serde(default)]
    pub links: Vec<CatalogLink>,
}

impl CatalogEntry {
    /// Returns the `name:tag` key identifying this entry
    pub fn key(&self) -> String {
        entry_key(&self.name, &self.tag)
    }
}

/// Joins name and tag into the single `name:tag` key
pub fn entry_key(name: &str, tag: &str) -> String {
    format!("{}:{}", name, tag)
}

/// A display link attached to a catalog entry
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CatalogLink {
    #[serde(default)]
    pub icon_class: String,
    pub name: String,
    pub url: String,
}

impl CatalogLink {
    pub fn new(name: &str, url: impl Into<String>, icon_class: &str) -> Self {
        Self {
            icon_class: icon_class.to_string(),
            name: name.to_string(),
            url: url.into(),
        }
    }
}

/// Point-in-time source of the catalog, re-read once per scheduling pass
pub trait CatalogSource: Send + Sync {
    fn snapshot(&self) -> Vec<CatalogEntry>;
}

impl CatalogSource for Vec<CatalogEntry> {
    fn snapshot(&self) -> Vec<CatalogEntry> {
        self.clone()
    }
}
