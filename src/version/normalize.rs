//! Normalization applied exactly once to every fetch result
//!
//! Fetchers return versions the way the upstream spells them (`v1.2.3`) and
//! timestamps with whatever precision the source has. Before a result is
//! compared or stored, the leading `v` is stripped and timestamps are
//! truncated to whole seconds in UTC.

use chrono::{DateTime, SubsecRound, Utc};

use crate::fetcher::FetchedVersion;

/// A fetch result ready for comparison and storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedVersion {
    pub version: String,
    pub observed_at: Option<DateTime<Utc>>,
}

/// Strips a single leading `v` from a version string
pub fn normalize_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Drops sub-second precision from a timestamp
pub fn truncate_to_seconds(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(0)
}

/// Normalizes a fetch result, returning `None` when no version is left
pub fn normalize(fetched: FetchedVersion) -> Option<NormalizedVersion> {
    let version = normalize_version(fetched.version.trim());
    if version.is_empty() {
        return None;
    }

    Some(NormalizedVersion {
        version: version.to_string(),
        observed_at: fetched.observed_at.map(truncate_to_seconds),
    })
}
