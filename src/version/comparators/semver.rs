use semver::Version;

use crate::version::comparator::{Comparator, Comparison};
use crate::version::error::CompareError;

/// Compares versions by Semantic Versioning precedence
///
/// Parsing is strict: `1.2` or `v1.2.3` are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemverComparator;

impl Comparator for SemverComparator {
    fn compare(&self, old_version: &str, new_version: &str) -> Result<Comparison, CompareError> {
        let old = Version::parse(old_version).map_err(|e| CompareError::InvalidOldVersion {
            version: old_version.to_string(),
            reason: e.to_string(),
        })?;
        let new = Version::parse(new_version).map_err(|e| CompareError::InvalidNewVersion {
            version: new_version.to_string(),
            reason: e.to_string(),
        })?;

        // Build metadata does not take part in precedence
        Ok(match old.cmp_precedence(&new) {
            std::cmp::Ordering::Less => Comparison::Upgrade,
            std::cmp::Ordering::Greater => Comparison::Downgrade,
            std::cmp::Ordering::Equal => Comparison::Equal,
        })
    }

    fn is_prerelease(&self, version: &str) -> Result<bool, CompareError> {
        let parsed = Version::parse(version).map_err(|e| CompareError::InvalidNewVersion {
            version: version.to_string(),
            reason: e.to_string(),
        })?;

        Ok(!parsed.pre.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.0.0", "2.0.0", Comparison::Upgrade)]
    #[case("2.0.0", "2.1.0", Comparison::Upgrade)]
    #[case("2.1.0", "2.1.1", Comparison::Upgrade)]
    #[case("2.1.1", "2.1.0", Comparison::Downgrade)]
    #[case("2.1.1", "2.1.1", Comparison::Equal)]
    #[case("2.0.0-rc.1", "2.0.0", Comparison::Upgrade)]
    #[case("2.0.0", "2.0.0-rc.1", Comparison::Downgrade)]
    #[case("1.0.0+build.1", "1.0.0+build.2", Comparison::Equal)]
    fn compare_returns_expected(#[case] old: &str, #[case] new: &str, #[case] expected: Comparison) {
        assert_eq!(SemverComparator.compare(old, new).unwrap(), expected);
    }

    #[rstest]
    #[case("1.2", "1.2.0")]
    #[case("latest", "1.0.0")]
    fn compare_rejects_non_semver_old_version(#[case] old: &str, #[case] new: &str) {
        assert!(matches!(
            SemverComparator.compare(old, new),
            Err(CompareError::InvalidOldVersion { .. })
        ));
    }

    #[rstest]
    #[case("1.0.0-beta.2", true)]
    #[case("1.0.0", false)]
    #[case("1.0.0+meta", false)]
    fn is_prerelease_detects_pre_component(#[case] version: &str, #[case] expected: bool) {
        assert_eq!(SemverComparator.is_prerelease(version).unwrap(), expected);
    }

    #[test]
    fn is_prerelease_rejects_invalid_version() {
        assert!(SemverComparator.is_prerelease("nope").is_err());
    }
}
