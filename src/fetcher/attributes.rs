//! Flat, typed attribute map holding a fetcher's configuration

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("{0} is expected to be non-empty string")]
    Empty(String),

    #[error("attribute {key} is expected to be {expected}")]
    WrongType { key: String, expected: &'static str },
}

/// Named configuration attributes of a catalog entry's fetcher
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style setter, mostly used when constructing entries in code
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns a required, non-empty string attribute
    pub fn string(&self, key: &str) -> Result<&str, AttributeError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Err(AttributeError::Empty(key.to_string())),
            Some(Value::String(s)) if s.is_empty() => Err(AttributeError::Empty(key.to_string())),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(AttributeError::WrongType {
                key: key.to_string(),
                expected: "string",
            }),
        }
    }

    /// Returns an optional string attribute, falling back to `default` when unset
    pub fn string_or<'a>(&'a self, key: &str, default: &'a str) -> Result<&'a str, AttributeError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(AttributeError::WrongType {
                key: key.to_string(),
                expected: "string",
            }),
        }
    }

    /// Returns an optional boolean attribute, falling back to `default` when unset
    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, AttributeError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(AttributeError::WrongType {
                key: key.to_string(),
                expected: "boolean",
            }),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
