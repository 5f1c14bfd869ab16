//! Fetcher locating a version in an HTML page with XPath

use reqwest::Client;

use crate::catalog::CatalogLink;
use crate::fetcher::attributes::Attributes;
use crate::fetcher::error::{FetchError, FetcherConfigError};
use crate::fetcher::http::{build_client, get_text};
use crate::fetcher::query::VersionQuery;
use crate::fetcher::traits::{FetchedVersion, Fetcher};
use crate::xpath::Document;

/// Attributes:
/// - `url` (required): page to fetch
/// - `xpath` (required): expression selecting exactly one node
/// - `regex` (optional): single capture group applied to the node's text
pub struct HtmlFetcher {
    client: Client,
}

impl Default for HtmlFetcher {
    fn default() -> Self {
        Self {
            client: build_client(None),
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for HtmlFetcher {
    async fn fetch_version(&self, attrs: &Attributes) -> Result<FetchedVersion, FetchError> {
        let query = VersionQuery::from_attributes(attrs)?;
        let body = get_text(&self.client, attrs.string("url")?).await?;

        let doc = Document::from_html(&body);
        Ok(FetchedVersion::observed_now(query.extract(&doc)?))
    }

    fn links(&self, attrs: &Attributes) -> Vec<CatalogLink> {
        match attrs.string("url") {
            Ok(url) => vec![CatalogLink::new("Website", url, "fas fa-globe")],
            Err(_) => Vec::new(),
        }
    }

    fn validate(&self, attrs: &Attributes) -> Result<(), FetcherConfigError> {
        attrs.string("url")?;
        VersionQuery::from_attributes(attrs)?;
        Ok(())
    }
}
