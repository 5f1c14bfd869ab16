//! Git tag fetcher reading tags from a remote repository

use std::path::Path;

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::catalog::CatalogLink;
use crate::fetcher::attributes::Attributes;
use crate::fetcher::error::{FetchError, FetcherConfigError};
use crate::fetcher::traits::{FetchedVersion, Fetcher};

/// Tag name, tagger date of annotated tags, committer date of the commit an
/// annotated tag points to, committer date of lightweight tags
const TAG_FORMAT: &str =
    "%(refname:lstrip=2)%09%(taggerdate:unix)%09%(*committerdate:unix)%09%(committerdate:unix)";

/// Fetches tags (annotated and lightweight) from a remote and returns the newest
///
/// Only tag references are fetched, shallow, into a throwaway bare
/// repository. Annotated tags are dated by their tagger, or by the commit
/// they point to when they carry no tagger; lightweight tags by their commit.
///
/// Attributes:
/// - `remote` (required): anything `git fetch` accepts as a remote
#[derive(Debug, Clone, Copy, Default)]
pub struct GitTagFetcher;

/// A tag together with the time used to order it
#[derive(Debug, Clone, PartialEq, Eq)]
struct TagInfo {
    name: String,
    time: DateTime<Utc>,
}

impl GitTagFetcher {
    async fn git(dir: &Path, args: &[&str]) -> Result<String, FetchError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| FetchError::Git(format!("executing git: {}", e)))?;

        if !output.status.success() {
            return Err(FetchError::Git(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Parses `for-each-ref` output in [`TAG_FORMAT`]
    ///
    /// Tags without any usable date sort as the Unix epoch, so they never
    /// hide a dated tag and never fail the whole listing.
    fn parse_tags(output: &str) -> Vec<TagInfo> {
        output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let mut fields = line.split('\t');
                let name = fields.next().unwrap_or_default();

                let time = fields
                    .map(str::trim)
                    .find(|v| !v.is_empty())
                    .and_then(|v| v.parse::<i64>().ok())
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .unwrap_or_else(|| {
                        warn!("Tag {} has no usable date, treating it as oldest", name);
                        DateTime::<Utc>::UNIX_EPOCH
                    });

                TagInfo {
                    name: name.to_string(),
                    time,
                }
            })
            .collect()
    }

    /// Newest tag by time, the first one listed wins ties
    fn select_latest(tags: Vec<TagInfo>) -> Option<TagInfo> {
        tags.into_iter().fold(None, |latest: Option<TagInfo>, tag| match latest {
            Some(current) if current.time >= tag.time => Some(current),
            _ => Some(tag),
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for GitTagFetcher {
    async fn fetch_version(&self, attrs: &Attributes) -> Result<FetchedVersion, FetchError> {
        let remote = attrs.string("remote")?;

        let workdir = TempDir::new()
            .map_err(|e| FetchError::Git(format!("creating temporary repository: {}", e)))?;
        let dir = workdir.path();

        Self::git(dir, &["init", "--bare", "--quiet"]).await?;
        debug!("Fetching tags from {}", remote);
        Self::git(
            dir,
            &[
                "fetch",
                "--quiet",
                "--no-tags",
                "--depth=1",
                remote,
                "+refs/tags/*:refs/tags/*",
            ],
        )
        .await?;

        let listing = Self::git(
            dir,
            &["for-each-ref", &format!("--format={}", TAG_FORMAT), "refs/tags"],
        )
        .await?;

        let tag = Self::select_latest(Self::parse_tags(&listing)).ok_or(FetchError::NoVersionFound)?;

        Ok(FetchedVersion::new(tag.name, Some(tag.time)))
    }

    fn links(&self, _attrs: &Attributes) -> Vec<CatalogLink> {
        Vec::new()
    }

    fn validate(&self, attrs: &Attributes) -> Result<(), FetcherConfigError> {
        attrs.string("remote")?;
        Ok(())
    }
}
