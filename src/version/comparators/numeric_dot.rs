use crate::version::comparator::{Comparator, Comparison};
use crate::version::error::CompareError;

/// Compares dot separated integer versions like `103.0.5060.134`
///
/// Segments are signed integers and missing trailing segments count as
/// zero, so `1.2` equals `1.2.0` and `-1` sorts before `0`.
/// There is no pre-release marker in this scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericDotComparator;

impl NumericDotComparator {
    fn parse(version: &str) -> Result<Vec<i64>, String> {
        version
            .split('.')
            .map(|segment| {
                segment
                    .parse::<i64>()
                    .map_err(|e| format!("parsing segment {:?}: {}", segment, e))
            })
            .collect()
    }
}

impl Comparator for NumericDotComparator {
    fn compare(&self, old_version: &str, new_version: &str) -> Result<Comparison, CompareError> {
        let old = Self::parse(old_version).map_err(|reason| CompareError::InvalidOldVersion {
            version: old_version.to_string(),
            reason,
        })?;
        let new = Self::parse(new_version).map_err(|reason| CompareError::InvalidNewVersion {
            version: new_version.to_string(),
            reason,
        })?;

        let segment = |v: &[i64], i: usize| v.get(i).copied().unwrap_or(0);

        for i in 0..old.len().max(new.len()) {
            match segment(&old, i).cmp(&segment(&new, i)) {
                std::cmp::Ordering::Less => return Ok(Comparison::Upgrade),
                std::cmp::Ordering::Greater => return Ok(Comparison::Downgrade),
                std::cmp::Ordering::Equal => continue,
            }
        }

        Ok(Comparison::Equal)
    }

    fn is_prerelease(&self, _version: &str) -> Result<bool, CompareError> {
        Ok(false)
    }
}
