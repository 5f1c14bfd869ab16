//! Fetcher applying a regular expression to a raw web document

use regex::Regex;
use reqwest::Client;

use crate::catalog::CatalogLink;
use crate::fetcher::attributes::Attributes;
use crate::fetcher::error::{FetchError, FetcherConfigError};
use crate::fetcher::http::{build_client, get_text};
use crate::fetcher::traits::{FetchedVersion, Fetcher};

/// Fetches a URL and extracts the version with a single capture group
///
/// Attributes:
/// - `url` (required): document to fetch
/// - `regex` (required): expression with exactly one capture group
pub struct RegexFetcher {
    client: Client,
}

impl Default for RegexFetcher {
    fn default() -> Self {
        Self {
            client: build_client(None),
        }
    }
}

/// Compiles `pattern` and checks it has exactly one capture group
pub(crate) fn compile_single_capture(pattern: &str) -> Result<Regex, FetcherConfigError> {
    let regex = Regex::new(pattern)?;
    // captures_len includes the implicit group 0
    match regex.captures_len() - 1 {
        1 => Ok(regex),
        n => Err(FetcherConfigError::CaptureGroups(n)),
    }
}

#[async_trait::async_trait]
impl Fetcher for RegexFetcher {
    async fn fetch_version(&self, attrs: &Attributes) -> Result<FetchedVersion, FetchError> {
        let regex = compile_single_capture(attrs.string("regex")?)?;
        let body = get_text(&self.client, attrs.string("url")?).await?;

        let version = regex
            .captures(&body)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(FetchError::RegexNoMatch)?;

        Ok(FetchedVersion::observed_now(version))
    }

    fn links(&self, attrs: &Attributes) -> Vec<CatalogLink> {
        match attrs.string("url") {
            Ok(url) => vec![CatalogLink::new("Website", url, "fas fa-globe")],
            Err(_) => Vec::new(),
        }
    }

    fn validate(&self, attrs: &Attributes) -> Result<(), FetcherConfigError> {
        attrs.string("url")?;
        compile_single_capture(attrs.string("regex")?)?;
        Ok(())
    }
}
