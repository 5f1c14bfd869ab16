use crate::version::comparator::{Comparator, Comparison};
use crate::version::error::CompareError;

/// Treats any string difference as an upgrade
///
/// Backs entries without a configured constraint, where every changed
/// version replaces the stored one.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralComparator;

impl Comparator for LiteralComparator {
    fn compare(&self, old_version: &str, new_version: &str) -> Result<Comparison, CompareError> {
        if old_version == new_version {
            Ok(Comparison::Equal)
        } else {
            Ok(Comparison::Upgrade)
        }
    }

    fn is_prerelease(&self, _version: &str) -> Result<bool, CompareError> {
        Ok(false)
    }
}
