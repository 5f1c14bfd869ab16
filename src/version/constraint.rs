//! Update policy deciding whether a newly observed version replaces the stored one

use serde::Deserialize;

use crate::version::comparator::{Comparator, Comparison};
use crate::version::comparators::{LiteralComparator, NumericDotComparator, SemverComparator};
use crate::version::error::CompareError;

/// Version scheme used to compare two versions of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorType {
    /// Dot separated integers (`103.0.5060.134`)
    NumericDot,
    /// Semantic Versioning 2.0
    Semver,
    /// Plain string difference, used when no constraint is configured
    #[serde(skip_deserializing)]
    Literal,
}

impl ComparatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparatorType::NumericDot => "numeric_dot",
            ComparatorType::Semver => "semver",
            ComparatorType::Literal => "literal",
        }
    }

    fn comparator(&self) -> &'static dyn Comparator {
        match self {
            ComparatorType::NumericDot => &NumericDotComparator,
            ComparatorType::Semver => &SemverComparator,
            ComparatorType::Literal => &LiteralComparator,
        }
    }
}

/// Policy applied before a new version overwrites the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constraint {
    #[serde(rename = "type")]
    pub comparator: ComparatorType,
    #[serde(default)]
    pub allow_downgrade: bool,
    #[serde(default)]
    pub allow_prerelease: bool,
}

impl Default for Constraint {
    /// Policy for entries without a configured constraint: any changed
    /// version is accepted, including downgrades and pre-releases
    fn default() -> Self {
        Self {
            comparator: ComparatorType::Literal,
            allow_downgrade: true,
            allow_prerelease: true,
        }
    }
}

impl Constraint {
    /// Returns the configured constraint or the unconditional default
    pub fn resolve(configured: Option<&Constraint>) -> Constraint {
        configured.copied().unwrap_or_default()
    }

    /// Checks whether `new_version` should overwrite `old_version`
    ///
    /// An empty `old_version` is always replaced by a non-empty one without
    /// consulting the comparator. Unparsable versions are reported as
    /// [`CompareError`] and never silently accepted or rejected.
    pub fn should_apply(&self, old_version: &str, new_version: &str) -> Result<bool, CompareError> {
        if old_version.is_empty() && !new_version.is_empty() {
            return Ok(true);
        }

        let comparator = self.comparator.comparator();

        let comparison = comparator.compare(old_version, new_version)?;
        if !self.allow_downgrade && comparison != Comparison::Upgrade {
            return Ok(false);
        }

        if !self.allow_prerelease && comparator.is_prerelease(new_version)? {
            return Ok(false);
        }

        Ok(true)
    }
}
