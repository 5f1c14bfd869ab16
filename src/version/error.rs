use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("parsing old version {version:?}: {reason}")]
    InvalidOldVersion { version: String, reason: String },

    #[error("parsing new version {version:?}: {reason}")]
    InvalidNewVersion { version: String, reason: String },
}
