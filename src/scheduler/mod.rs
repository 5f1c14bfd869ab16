//! Periodic checking of catalog entries
//!
//! - [`jitter`]: per-entry due times spread over the distribution window
//! - [`orchestrator`]: single-flight passes tying catalog, fetchers,
//!   constraint and store together

pub mod jitter;
pub mod orchestrator;

pub use jitter::Schedule;
pub use orchestrator::{CheckOutcome, Orchestrator, PassReport};
