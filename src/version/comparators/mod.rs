//! Concrete [`Comparator`](crate::version::comparator::Comparator) implementations

pub mod literal;
pub mod numeric_dot;
pub mod semver;

pub use literal::LiteralComparator;
pub use numeric_dot::NumericDotComparator;
pub use semver::SemverComparator;
