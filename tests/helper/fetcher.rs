//! Fetcher test utilities

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use latestver::catalog::CatalogLink;
use latestver::fetcher::attributes::Attributes;
use latestver::fetcher::{FetchError, FetchedVersion, Fetcher, FetcherConfigError, FetcherRegistry};

/// Fetcher answering from a per-package script of versions
///
/// Each fetch pops the next version for the entry's `package` attribute.
/// The last version is repeated once the script runs out; an unknown
/// package yields [`FetchError::NoVersionFound`].
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    scripts: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(self, package: &str, versions: Vec<&str>) -> Self {
        self.scripts.lock().unwrap().insert(
            package.to_string(),
            versions.into_iter().map(|v| v.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch_version(&self, attrs: &Attributes) -> Result<FetchedVersion, FetchError> {
        let package = attrs.string("package")?;
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .get_mut(package)
            .ok_or(FetchError::NoVersionFound)?;

        let version = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };

        version
            .map(FetchedVersion::observed_now)
            .ok_or(FetchError::NoVersionFound)
    }

    fn links(&self, _attrs: &Attributes) -> Vec<CatalogLink> {
        Vec::new()
    }

    fn validate(&self, attrs: &Attributes) -> Result<(), FetcherConfigError> {
        attrs.string("package")?;
        Ok(())
    }
}

/// Built-in fetchers plus `fetcher` registered as "scripted"
///
/// Every constructed instance shares the same script.
pub fn registry_with_scripted(fetcher: ScriptedFetcher) -> FetcherRegistry {
    let mut registry = FetcherRegistry::with_defaults();
    registry.register("scripted", move || Box::new(fetcher.clone()));
    registry
}
