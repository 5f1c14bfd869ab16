//! Fetcher trait definition

use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use crate::catalog::CatalogLink;
use crate::fetcher::attributes::Attributes;
use crate::fetcher::error::{FetchError, FetcherConfigError};

/// Raw result of a fetch, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedVersion {
    /// Version as spelled by the upstream source
    pub version: String,
    /// When the version was published, if the source tells
    pub observed_at: Option<DateTime<Utc>>,
}

impl FetchedVersion {
    pub fn new(version: impl Into<String>, observed_at: Option<DateTime<Utc>>) -> Self {
        Self {
            version: version.into(),
            observed_at,
        }
    }

    /// Result for sources without any publish time: observed now
    pub fn observed_now(version: impl Into<String>) -> Self {
        Self::new(version, Some(Utc::now()))
    }
}

/// Trait every source-specific fetcher implements
///
/// Implementations are stateless with regard to the catalog entry: the
/// entry's attributes are passed to every call. Cancellation happens by
/// dropping the returned future.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieves the current version for the configured upstream
    async fn fetch_version(&self, attrs: &Attributes) -> Result<FetchedVersion, FetchError>;

    /// Links to show next to the entry
    fn links(&self, attrs: &Attributes) -> Vec<CatalogLink>;

    /// Validates the attributes once when the catalog loads
    fn validate(&self, attrs: &Attributes) -> Result<(), FetcherConfigError>;
}
