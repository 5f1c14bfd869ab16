//! HTTP helpers shared by the web based fetchers

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::USER_AGENT;
use crate::fetcher::error::FetchError;

/// Captures the payload of a JSONP document such as `downloads([...])`
static JSONP_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^[^(]+\((.*)\)\s*;?\s*$").expect("valid JSONP regex"));

/// Creates an HTTP client with the crate's user agent and an optional overall timeout
pub fn build_client(timeout: Option<Duration>) -> Client {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().expect("Failed to create HTTP client")
}

/// GETs `url` and returns the body, failing on any non-success status
pub async fn get_text(client: &Client, url: &str) -> Result<String, FetchError> {
    debug!("Fetching {}", url);

    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        warn!("{} returned status {}", url, status);
        return Err(FetchError::UnexpectedStatus(status.as_u16()));
    }

    Ok(response.text().await?)
}

/// Strips the function call wrapping a JSONP document
pub fn strip_jsonp(body: &str) -> Result<&str, FetchError> {
    JSONP_STRIP
        .captures(body.trim())
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .ok_or(FetchError::JsonpMismatch)
}

/// Maps a request timeout onto [`FetchError::Timeout`]
pub fn map_timeout(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Network(error)
    }
}
