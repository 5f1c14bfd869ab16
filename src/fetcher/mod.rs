//! Pluggable version fetching
//!
//! # Modules
//!
//! - [`traits`]: `Fetcher` trait and `FetchedVersion`
//! - [`registry`]: name to constructor lookup table
//! - [`fetchers`]: concrete fetchers (github_release, git_tag, helm, ...)
//! - [`attributes`]: typed access to a fetcher's configuration
//! - [`http`]: shared HTTP and JSONP helpers
//! - [`query`]: XPath and regex extraction for the HTML and JSON fetchers
//! - [`error`]: fetch and configuration errors

pub mod attributes;
pub mod error;
pub mod fetchers;
pub mod http;
pub mod query;
pub mod registry;
pub mod traits;

pub use error::{FetchError, FetcherConfigError};
pub use registry::FetcherRegistry;
pub use traits::{FetchedVersion, Fetcher};
