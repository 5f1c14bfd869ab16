//! Tracks the latest known version of software artifacts.
//!
//! A catalog of entries is checked on a fixed tick. Every entry names a
//! [`fetcher`] that knows how to read the current version from one kind of
//! upstream source, an optional [`version::constraint::Constraint`] that
//! decides whether a newly observed version replaces the stored one, and a
//! [`store`] that keeps the current state plus an append-only change log.
//!
//! - [`catalog`]: catalog entries and links
//! - [`config`]: configuration file, defaults and data directory
//! - [`fetcher`]: fetcher trait, registry and the concrete fetchers
//! - [`logging`]: tracing subscriber setup
//! - [`scheduler`]: jitter schedule and the pass orchestrator
//! - [`store`]: metadata store contract and the SQLite implementation
//! - [`version`]: comparators, update constraint and normalization
//! - [`xpath`]: the XPath subset used by the HTML and JSON fetchers

pub mod catalog;
pub mod config;
pub mod fetcher;
pub mod logging;
pub mod scheduler;
pub mod store;
pub mod version;
pub mod xpath;
