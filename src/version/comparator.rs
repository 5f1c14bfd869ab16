//! Comparison abstraction shared by all version schemes

use crate::version::error::CompareError;

/// Result of comparing a stored version against a newly observed one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// The new version is greater than the old one
    Upgrade,
    /// The new version is smaller than the old one
    Downgrade,
    /// Both versions have the same precedence
    Equal,
}

/// Trait implemented by every version scheme
///
/// - numeric_dot: `1.2.10` compared segment by segment as integers
/// - semver: Semantic Versioning 2.0 precedence rules
pub trait Comparator: Send + Sync {
    /// Compare `old_version` to `new_version`
    fn compare(&self, old_version: &str, new_version: &str) -> Result<Comparison, CompareError>;

    /// Whether `version` carries a pre-release marker
    fn is_prerelease(&self, version: &str) -> Result<bool, CompareError>;
}
