//! Atlassian product download feed fetcher

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::catalog::CatalogLink;
use crate::fetcher::attributes::Attributes;
use crate::fetcher::error::{FetchError, FetcherConfigError};
use crate::fetcher::http::{build_client, get_text, strip_jsonp};
use crate::fetcher::traits::{FetchedVersion, Fetcher};

/// Default base URL of the download feeds
const DEFAULT_BASE_URL: &str = "https://my.atlassian.com/download/feeds/current";

/// Default download description filter: the standalone `.tar.gz` archive
const DEFAULT_SEARCH: &str = "TAR.GZ";

/// Release date format used by the feed (`05-Mar-2024`)
const RELEASE_DATE_FORMAT: &str = "%d-%b-%Y";

/// One downloadable artifact in the feed
#[derive(Debug, Clone, Deserialize)]
struct Release {
    #[serde(default)]
    description: String,
    #[serde(default)]
    edition: String,
    #[serde(default)]
    released: String,
    version: String,
}

impl Release {
    fn released_at(&self) -> Option<DateTime<Utc>> {
        NaiveDate::parse_from_str(&self.released, RELEASE_DATE_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc())
    }
}

/// Fetches the latest version of an Atlassian product from its download feed
///
/// Attributes:
/// - `product` (required): lowercase product name (`confluence`, `jira-software`)
/// - `edition` (optional): substring the edition must contain (`Enterprise`)
/// - `search` (optional, default `TAR.GZ`): substring the description must contain
pub struct AtlassianFetcher {
    client: Client,
    base_url: String,
}

impl AtlassianFetcher {
    /// Creates a new AtlassianFetcher with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: build_client(None),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Newest matching release; release dates that fail to parse sort last
    fn select_latest<'a>(releases: &'a mut [Release], edition: &str, search: &str) -> Option<&'a Release> {
        releases.sort_by_key(|r| std::cmp::Reverse(r.released_at()));

        releases.iter().find(|r| {
            (edition.is_empty() || r.edition.contains(edition))
                && (search.is_empty() || r.description.contains(search))
        })
    }
}

impl Default for AtlassianFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Fetcher for AtlassianFetcher {
    async fn fetch_version(&self, attrs: &Attributes) -> Result<FetchedVersion, FetchError> {
        let product = attrs.string("product")?;
        let edition = attrs.string_or("edition", "")?;
        let search = attrs.string_or("search", DEFAULT_SEARCH)?;

        let url = format!("{}/{}.json", self.base_url, product);
        let body = get_text(&self.client, &url).await?;

        let mut releases: Vec<Release> = serde_json::from_str(strip_jsonp(&body)?)
            .map_err(|e| FetchError::InvalidResponse(format!("parsing response JSON: {}", e)))?;
        debug!("Feed for {} lists {} downloads", product, releases.len());

        let release = Self::select_latest(&mut releases, edition, search).ok_or(FetchError::NoVersionFound)?;

        Ok(FetchedVersion::new(release.version.clone(), release.released_at()))
    }

    fn links(&self, _attrs: &Attributes) -> Vec<CatalogLink> {
        Vec::new()
    }

    fn validate(&self, attrs: &Attributes) -> Result<(), FetcherConfigError> {
        attrs.string("product")?;
        attrs.string_or("edition", "")?;
        attrs.string_or("search", DEFAULT_SEARCH)?;
        Ok(())
    }
}
