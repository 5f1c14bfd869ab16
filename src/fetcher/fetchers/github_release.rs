//! GitHub Releases API fetcher

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::catalog::CatalogLink;
use crate::config::GITHUB_HTTP_TIMEOUT;
use crate::fetcher::attributes::Attributes;
use crate::fetcher::error::{FetchError, FetcherConfigError};
use crate::fetcher::http::{build_client, map_timeout};
use crate::fetcher::traits::{FetchedVersion, Fetcher};

/// Default base URL for GitHub API
const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Response item from GitHub Releases API
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    prerelease: bool,
}

/// Basic auth credentials raising the API rate limit
#[derive(Debug, Clone, PartialEq, Eq)]
struct Credentials {
    client_id: String,
    client_secret: String,
}

/// Fetches the newest release of a repository that is not marked as pre-release
///
/// Attributes:
/// - `repository` (required): repository in `owner/repo` form
pub struct GitHubReleaseFetcher {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl GitHubReleaseFetcher {
    /// Creates a new GitHubReleaseFetcher with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: build_client(Some(GITHUB_HTTP_TIMEOUT)),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
        }
    }

    /// Uses basic auth for every request
    pub fn with_credentials(mut self, client_id: &str, client_secret: &str) -> Self {
        self.credentials = Some(Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        });
        self
    }

    /// Picks the non pre-release with the latest publish time
    fn select_latest(releases: Vec<Release>) -> Option<Release> {
        releases
            .into_iter()
            .filter(|r| !r.prerelease)
            .fold(None, |latest: Option<Release>, release| match latest {
                Some(current) if current.published_at >= release.published_at => Some(current),
                _ => Some(release),
            })
    }
}

impl Default for GitHubReleaseFetcher {
    /// Uses the public API, authenticated when `GITHUB_CLIENT_ID` and
    /// `GITHUB_CLIENT_SECRET` are both set
    fn default() -> Self {
        let fetcher = Self::new(DEFAULT_BASE_URL);
        match (
            std::env::var("GITHUB_CLIENT_ID"),
            std::env::var("GITHUB_CLIENT_SECRET"),
        ) {
            (Ok(id), Ok(secret)) if !id.is_empty() && !secret.is_empty() => {
                fetcher.with_credentials(&id, &secret)
            }
            _ => fetcher,
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for GitHubReleaseFetcher {
    async fn fetch_version(&self, attrs: &Attributes) -> Result<FetchedVersion, FetchError> {
        let repository = attrs.string("repository")?;
        let url = format!("{}/repos/{}/releases", self.base_url, repository);
        debug!("Fetching GitHub releases: {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.client_id, Some(&credentials.client_secret));
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_timeout(e, GITHUB_HTTP_TIMEOUT))?;

        let status = response.status();
        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(FetchError::UnexpectedStatus(status.as_u16()));
        }

        let releases: Vec<Release> = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub releases response: {}", e);
            FetchError::InvalidResponse(e.to_string())
        })?;

        let release = Self::select_latest(releases).ok_or(FetchError::NoVersionFound)?;

        Ok(FetchedVersion::new(release.tag_name, release.published_at))
    }

    fn links(&self, attrs: &Attributes) -> Vec<CatalogLink> {
        match attrs.string("repository") {
            Ok(repository) => vec![CatalogLink::new(
                "Repository",
                format!("https://github.com/{}", repository),
                "fab fa-github",
            )],
            Err(_) => Vec::new(),
        }
    }

    fn validate(&self, attrs: &Attributes) -> Result<(), FetcherConfigError> {
        attrs.string("repository")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::{Matcher, Server};
    use serial_test::serial;

    fn attrs() -> Attributes {
        Attributes::new().with("repository", "traefik/traefik")
    }

    #[tokio::test]
    async fn fetch_version_returns_latest_published_non_prerelease() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/traefik/traefik/releases")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"tag_name": "v3.1.0-rc1", "published_at": "2024-03-01T00:00:00Z", "prerelease": true},
                    {"tag_name": "v2.11.1", "published_at": "2024-02-10T00:00:00Z", "prerelease": false},
                    {"tag_name": "v3.0.0", "published_at": "2024-02-01T12:30:00Z", "prerelease": false},
                    {"tag_name": "v2.11.0", "published_at": "2024-01-15T00:00:00Z", "prerelease": false}
                ]"#,
            )
            .create_async()
            .await;

        let fetcher = GitHubReleaseFetcher::new(&server.url());
        let result = fetcher.fetch_version(&attrs()).await.unwrap();

        mock.assert_async().await;
        // Publish time decides, not list order or version precedence
        assert_eq!(result.version, "v2.11.1");
        assert_eq!(
            result.observed_at,
            Some(Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn fetch_version_returns_no_version_found_when_only_prereleases() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/traefik/traefik/releases")
            .with_status(200)
            .with_body(
                r#"[{"tag_name": "v3.1.0-rc1", "published_at": "2024-03-01T00:00:00Z", "prerelease": true}]"#,
            )
            .create_async()
            .await;

        let fetcher = GitHubReleaseFetcher::new(&server.url());
        let result = fetcher.fetch_version(&attrs()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::NoVersionFound)));
    }

    #[tokio::test]
    async fn fetch_version_returns_no_version_found_for_repo_without_releases() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/traefik/traefik/releases")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let fetcher = GitHubReleaseFetcher::new(&server.url());
        let result = fetcher.fetch_version(&attrs()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::NoVersionFound)));
    }

    #[tokio::test]
    async fn fetch_version_fails_on_non_success_status() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/nonexistent/repo/releases")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let fetcher = GitHubReleaseFetcher::new(&server.url());
        let result = fetcher
            .fetch_version(&Attributes::new().with("repository", "nonexistent/repo"))
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::UnexpectedStatus(404))));
    }

    #[tokio::test]
    async fn fetch_version_fails_on_malformed_body() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/traefik/traefik/releases")
            .with_status(200)
            .with_body(r#"{"message": "not a list"}"#)
            .create_async()
            .await;

        let fetcher = GitHubReleaseFetcher::new(&server.url());
        let result = fetcher.fetch_version(&attrs()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_version_sends_basic_auth_when_configured() {
        let mut server = Server::new_async().await;

        // "id:secret" base64 encoded
        let mock = server
            .mock("GET", "/repos/traefik/traefik/releases")
            .match_header("authorization", Matcher::Exact("Basic aWQ6c2VjcmV0".to_string()))
            .with_status(200)
            .with_body(r#"[{"tag_name": "v1.0.0", "published_at": "2024-01-01T00:00:00Z"}]"#)
            .create_async()
            .await;

        let fetcher = GitHubReleaseFetcher::new(&server.url()).with_credentials("id", "secret");
        let result = fetcher.fetch_version(&attrs()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.version, "v1.0.0");
    }

    #[test]
    fn links_point_to_repository() {
        let fetcher = GitHubReleaseFetcher::new("http://localhost");

        assert_eq!(
            fetcher.links(&attrs()),
            vec![CatalogLink::new(
                "Repository",
                "https://github.com/traefik/traefik",
                "fab fa-github"
            )]
        );
    }

    #[test]
    fn validate_requires_repository() {
        let fetcher = GitHubReleaseFetcher::new("http://localhost");

        assert!(fetcher.validate(&attrs()).is_ok());
        assert!(fetcher.validate(&Attributes::new()).is_err());
        assert!(
            fetcher
                .validate(&Attributes::new().with("repository", ""))
                .is_err()
        );
    }

    #[test]
    #[serial]
    fn default_reads_credentials_from_env() {
        // SAFETY: serialized with every other test touching these variables
        unsafe {
            std::env::set_var("GITHUB_CLIENT_ID", "client");
            std::env::set_var("GITHUB_CLIENT_SECRET", "secret");
        }
        let authenticated = GitHubReleaseFetcher::default();

        unsafe {
            std::env::set_var("GITHUB_CLIENT_SECRET", "");
        }
        let half_configured = GitHubReleaseFetcher::default();

        unsafe {
            std::env::remove_var("GITHUB_CLIENT_ID");
            std::env::remove_var("GITHUB_CLIENT_SECRET");
        }
        let anonymous = GitHubReleaseFetcher::default();

        assert!(matches!(
            authenticated.credentials,
            Some(Credentials { ref client_id, ref client_secret })
                if client_id == "client" && client_secret == "secret"
        ));
        assert!(half_configured.credentials.is_none());
        assert!(anonymous.credentials.is_none());
        assert_eq!(anonymous.base_url, DEFAULT_BASE_URL);
    }
}
