//! Name to constructor lookup table for fetchers

use std::collections::HashMap;
use std::sync::Arc;

use crate::fetcher::fetchers::{
    AtlassianFetcher, GitHubReleaseFetcher, GitTagFetcher, HelmFetcher, HtmlFetcher, JsonFetcher,
    RegexFetcher,
};
use crate::fetcher::traits::Fetcher;

/// Creates a fresh fetcher instance
pub type FetcherConstructor = Arc<dyn Fn() -> Box<dyn Fetcher> + Send + Sync>;

/// Registry of available fetchers, built once at startup
///
/// The registry is an explicit value handed to the configuration validator
/// and the orchestrator, so tests can use a scoped registry of their own.
#[derive(Clone, Default)]
pub struct FetcherRegistry {
    constructors: HashMap<String, FetcherConstructor>,
}

impl FetcherRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in fetcher
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("atlassian", || Box::new(AtlassianFetcher::default()));
        registry.register("git_tag", || Box::new(GitTagFetcher));
        registry.register("github_release", || Box::new(GitHubReleaseFetcher::default()));
        registry.register("helm", || Box::new(HelmFetcher::default()));
        registry.register("html", || Box::new(HtmlFetcher::default()));
        registry.register("json", || Box::new(JsonFetcher::default()));
        registry.register("regex", || Box::new(RegexFetcher::default()));
        registry
    }

    /// Registers a constructor, replacing any previous one with the same id
    pub fn register<F>(&mut self, id: &str, constructor: F)
    where
        F: Fn() -> Box<dyn Fetcher> + Send + Sync + 'static,
    {
        self.constructors.insert(id.to_string(), Arc::new(constructor));
    }

    /// Returns a fresh instance of the fetcher, or `None` for unknown ids
    pub fn get(&self, id: &str) -> Option<Box<dyn Fetcher>> {
        self.constructors.get(id).map(|constructor| constructor())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    /// Registered ids in alphabetical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for FetcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetcherRegistry")
            .field("fetchers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::attributes::Attributes;
    use crate::fetcher::traits::{FetchedVersion, MockFetcher};

    #[test]
    fn with_defaults_registers_all_builtin_fetchers() {
        let registry = FetcherRegistry::with_defaults();

        assert_eq!(
            registry.names(),
            vec![
                "atlassian",
                "git_tag",
                "github_release",
                "helm",
                "html",
                "json",
                "regex"
            ]
        );
    }

    #[test]
    fn get_returns_none_for_unknown_fetcher() {
        let registry = FetcherRegistry::with_defaults();
        assert!(registry.get("svn_tag").is_none());
        assert!(!registry.contains("svn_tag"));
    }

    #[tokio::test]
    async fn get_returns_registered_fetcher() {
        let mut registry = FetcherRegistry::new();
        registry.register("static", || {
            let mut fetcher = MockFetcher::new();
            fetcher
                .expect_fetch_version()
                .returning(|_| Ok(FetchedVersion::new("1.2.3", None)));
            Box::new(fetcher)
        });

        let fetcher = registry.get("static").unwrap();
        let result = fetcher.fetch_version(&Attributes::new()).await.unwrap();

        assert_eq!(result.version, "1.2.3");
    }

    #[test]
    fn registries_are_independent() {
        let mut first = FetcherRegistry::new();
        let second = FetcherRegistry::new();

        first.register("static", || Box::new(MockFetcher::new()));

        assert!(first.contains("static"));
        assert!(!second.contains("static"));
    }
}
