//! Shared test utilities

#![allow(dead_code)]

mod fetcher;
mod store;

// Each test target uses its own subset
#[allow(unused_imports)]
pub use fetcher::{ScriptedFetcher, registry_with_scripted};
#[allow(unused_imports)]
pub use store::create_test_store;
