//! A small XPath 1.0 subset for locating version strings in documents
//!
//! Supported: absolute and relative location paths, `//`, `*`, `.`, `..`,
//! `text()`, `node()`, `@attr`, `@*`, positional predicates (`[2]`,
//! `[last()]`), comparisons with `=` / `!=`, `contains()`, `starts-with()`,
//! `not()`, `position()`, combined with `and` / `or`.
//!
//! HTML and JSON documents are both mapped onto [`Document`], so one
//! evaluator serves both fetchers.

pub mod document;
mod eval;
mod parser;

use thiserror::Error;

pub use document::{Document, Item, NodeId, NodeKind};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum XPathError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),

    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("unterminated string literal starting at offset {0}")]
    UnterminatedLiteral(usize),

    #[error("unsupported node test {0}()")]
    UnknownNodeTest(String),

    #[error("unsupported function {0}()")]
    UnknownFunction(String),

    #[error("{function}() takes {expected} argument(s), got {got}")]
    ArgumentCount {
        function: String,
        expected: usize,
        got: usize,
    },
}

/// A compiled expression
#[derive(Debug, Clone)]
pub struct XPath {
    source: String,
    path: parser::LocationPath,
}

impl XPath {
    pub fn compile(expr: &str) -> Result<Self, XPathError> {
        Ok(Self {
            source: expr.to_string(),
            path: parser::parse(expr)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Selected items in document order, without duplicates
    pub fn select(&self, doc: &Document) -> Vec<Item> {
        eval::select(doc, &self.path)
    }
}
