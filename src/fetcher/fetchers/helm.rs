//! Helm repository index fetcher

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::Client;
use semver::Version;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::catalog::CatalogLink;
use crate::fetcher::attributes::Attributes;
use crate::fetcher::error::{FetchError, FetcherConfigError};
use crate::fetcher::http::{build_client, get_text};
use crate::fetcher::traits::{FetchedVersion, Fetcher};

const INDEX_FILE: &str = "index.yaml";

/// Top level of a repository's `index.yaml`
#[derive(Debug, Deserialize)]
struct RawIndex {
    #[serde(rename = "apiVersion", default)]
    api_version: Option<String>,
    #[serde(default)]
    entries: HashMap<String, Vec<serde_yaml::Value>>,
}

/// The fields of a chart version this fetcher consumes
#[derive(Debug, Deserialize)]
struct RawChartVersion {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    created: Option<String>,
}

/// A valid chart version from the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartVersion {
    pub version: String,
    pub created: Option<DateTime<Utc>>,
    parsed: Version,
}

/// Fetches a Helm repository index and yields the latest chart version
///
/// Attributes:
/// - `repo` (required): URL of the repository (`https://grafana.github.io/helm-charts`)
/// - `chart` (required): chart to look up (`grafana`)
pub struct HelmFetcher {
    client: Client,
}

impl Default for HelmFetcher {
    fn default() -> Self {
        Self {
            client: build_client(None),
        }
    }
}

impl HelmFetcher {
    /// Appends `/index.yaml` unless the URL already points to the index
    pub fn index_url(repo_url: &str) -> String {
        if repo_url.ends_with(&format!("/{}", INDEX_FILE)) {
            return repo_url.to_string();
        }
        format!("{}/{}", repo_url.trim_end_matches('/'), INDEX_FILE)
    }

    /// Parses an index (YAML or JSON) and returns the versions of `chart`,
    /// newest first
    ///
    /// Entries missing a name or version, or whose version is not a semantic
    /// version, are skipped instead of failing the document.
    pub fn parse_index(data: &str, chart: &str) -> Result<Vec<ChartVersion>, FetchError> {
        if data.trim().is_empty() {
            return Err(FetchError::InvalidResponse("index file is empty".to_string()));
        }

        let index: RawIndex = serde_yaml::from_str(data)
            .map_err(|e| FetchError::InvalidResponse(format!("parsing index file: {}", e)))?;

        if index.api_version.as_deref().unwrap_or_default().is_empty() {
            return Err(FetchError::InvalidResponse(
                "no API version specified in index file".to_string(),
            ));
        }

        let Some(raw_versions) = index.entries.get(chart) else {
            return Ok(Vec::new());
        };

        let mut versions: Vec<ChartVersion> = raw_versions
            .iter()
            .filter_map(|raw| Self::parse_chart_version(chart, raw))
            .collect();

        versions.sort_by(|a, b| b.parsed.cmp(&a.parsed));

        Ok(versions)
    }

    fn parse_chart_version(chart: &str, raw: &serde_yaml::Value) -> Option<ChartVersion> {
        if raw.is_null() {
            warn!("Skipping invalid entry for chart {:?}: empty entry", chart);
            return None;
        }

        let entry: RawChartVersion = match serde_yaml::from_value(raw.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping invalid entry for chart {:?}: {}", chart, e);
                return None;
            }
        };

        if entry.name.as_deref().unwrap_or_default().is_empty() {
            warn!("Skipping invalid entry for chart {:?}: name is required", chart);
            return None;
        }

        let version = entry.version.unwrap_or_default();
        let Some(parsed) = parse_chart_semver(&version) else {
            warn!(
                "Skipping invalid entry for chart {:?} {:?}: version is not semver",
                chart, version
            );
            return None;
        };

        let created = entry
            .created
            .as_deref()
            .and_then(|c| DateTime::parse_from_rfc3339(c).ok())
            .map(|c| c.with_timezone(&Utc));

        Some(ChartVersion {
            version,
            created,
            parsed,
        })
    }
}

/// Parses a chart version the way Helm accepts them: an optional `v` prefix
/// and missing minor/patch components are tolerated
fn parse_chart_semver(version: &str) -> Option<Version> {
    let version = version.strip_prefix('v').unwrap_or(version);
    if version.is_empty() {
        return None;
    }

    // Pad only the numeric core, leaving any pre-release or build suffix in place
    let core_end = version.find(['-', '+']).unwrap_or(version.len());
    let (core, suffix) = version.split_at(core_end);
    let normalized = match core.split('.').count() {
        1 => format!("{}.0.0{}", core, suffix),
        2 => format!("{}.0{}", core, suffix),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

#[async_trait::async_trait]
impl Fetcher for HelmFetcher {
    async fn fetch_version(&self, attrs: &Attributes) -> Result<FetchedVersion, FetchError> {
        let url = Self::index_url(attrs.string("repo")?);
        let chart = attrs.string("chart")?;

        let body = get_text(&self.client, &url).await?;
        let versions = Self::parse_index(&body, chart)?;
        debug!("Found {} versions of chart {} in {}", versions.len(), chart, url);

        let latest = versions.into_iter().next().ok_or(FetchError::NoVersionFound)?;

        Ok(FetchedVersion::new(latest.version, latest.created))
    }

    fn links(&self, _attrs: &Attributes) -> Vec<CatalogLink> {
        Vec::new()
    }

    fn validate(&self, attrs: &Attributes) -> Result<(), FetcherConfigError> {
        attrs.string("repo")?;
        attrs.string("chart")?;
        Ok(())
    }
}
