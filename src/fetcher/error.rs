use thiserror::Error;

use crate::fetcher::attributes::AttributeError;
use crate::xpath::XPathError;

/// Failure while retrieving or interpreting an upstream source
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("document does not match jsonp syntax")]
    JsonpMismatch,

    #[error("no version found")]
    NoVersionFound,

    #[error("xpath expression matched {0} nodes, expected exactly one")]
    AmbiguousQuery(usize),

    #[error("xpath expression lead to unexpected node type: {0}")]
    UnexpectedNode(&'static str),

    #[error("regular expression did not yield version")]
    RegexNoMatch,

    #[error("git error: {0}")]
    Git(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("unknown fetcher: {0}")]
    UnknownFetcher(String),

    #[error("invalid fetcher config: {0}")]
    Config(#[from] FetcherConfigError),
}

/// Invalid or missing fetcher configuration, detected when the catalog loads
#[derive(Debug, Error)]
pub enum FetcherConfigError {
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error("compiling regex expression: {0}")]
    Regex(#[from] regex::Error),

    #[error("regex must have 1 submatch, has {0}")]
    CaptureGroups(usize),

    #[error("compiling xpath expression: {0}")]
    XPath(#[from] XPathError),
}

impl From<AttributeError> for FetchError {
    fn from(e: AttributeError) -> Self {
        FetchError::Config(FetcherConfigError::Attribute(e))
    }
}
