//! Fetcher locating a version in a JSON (or JSONP) document with XPath

use reqwest::Client;

use crate::catalog::CatalogLink;
use crate::fetcher::attributes::Attributes;
use crate::fetcher::error::{FetchError, FetcherConfigError};
use crate::fetcher::http::{build_client, get_text, strip_jsonp};
use crate::fetcher::query::VersionQuery;
use crate::fetcher::traits::{FetchedVersion, Fetcher};
use crate::xpath::Document;

/// Attributes:
/// - `url` (required): document to fetch
/// - `xpath` (required): expression selecting exactly one value
/// - `jsonp` (optional, default false): strip a JSONP callback wrapper first
/// - `regex` (optional): single capture group applied to the value
pub struct JsonFetcher {
    client: Client,
}

impl Default for JsonFetcher {
    fn default() -> Self {
        Self {
            client: build_client(None),
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for JsonFetcher {
    async fn fetch_version(&self, attrs: &Attributes) -> Result<FetchedVersion, FetchError> {
        let query = VersionQuery::from_attributes(attrs)?;
        let jsonp = attrs.bool_or("jsonp", false)?;
        let body = get_text(&self.client, attrs.string("url")?).await?;

        let payload = if jsonp { strip_jsonp(&body)? } else { body.as_str() };
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| FetchError::InvalidResponse(format!("parsing response JSON: {}", e)))?;

        let doc = Document::from_json(&value);
        Ok(FetchedVersion::observed_now(query.extract(&doc)?))
    }

    fn links(&self, _attrs: &Attributes) -> Vec<CatalogLink> {
        Vec::new()
    }

    fn validate(&self, attrs: &Attributes) -> Result<(), FetcherConfigError> {
        attrs.string("url")?;
        attrs.bool_or("jsonp", false)?;
        VersionQuery::from_attributes(attrs)?;
        Ok(())
    }
}
