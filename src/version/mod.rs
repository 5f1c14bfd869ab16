//! Version comparison and update policy
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Normalize  │────▶│  Constraint  │────▶│  Comparator  │
//! │ (v-prefix,  │     │ (downgrade,  │     │ (numeric_dot,│
//! │  seconds)   │     │  prerelease) │     │  semver)     │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! - [`comparator`]: `Comparator` trait and `Comparison` result
//! - [`comparators`]: numeric_dot, semver and literal comparators
//! - [`constraint`]: `Constraint` and its `should_apply` decision
//! - [`normalize`]: normalization of raw fetch results
//! - [`error`]: comparison errors

pub mod comparator;
pub mod comparators;
pub mod constraint;
pub mod error;
pub mod normalize;
