//! Concrete fetchers, one per upstream kind

pub mod atlassian;
pub mod git_tag;
pub mod github_release;
pub mod helm;
pub mod html;
pub mod json;
pub mod regex;

pub use atlassian::AtlassianFetcher;
pub use git_tag::GitTagFetcher;
pub use github_release::GitHubReleaseFetcher;
pub use helm::HelmFetcher;
pub use html::HtmlFetcher;
pub use json::JsonFetcher;
pub use regex::RegexFetcher;
