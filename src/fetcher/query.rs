//! XPath plus regular expression extraction shared by the HTML and JSON fetchers

use regex::Regex;

use crate::fetcher::attributes::Attributes;
use crate::fetcher::error::{FetchError, FetcherConfigError};
use crate::fetcher::fetchers::regex::compile_single_capture;
use crate::xpath::{Document, Item, NodeKind, XPath};

/// Applied to the selected text when the entry configures no `regex`
pub const DEFAULT_VERSION_REGEX: &str = r"(v?(?:[0-9]+\.?){2,})";

/// Compiled `xpath` and `regex` attributes
#[derive(Debug, Clone)]
pub struct VersionQuery {
    xpath: XPath,
    regex: Regex,
}

impl VersionQuery {
    pub fn from_attributes(attrs: &Attributes) -> Result<Self, FetcherConfigError> {
        let xpath = XPath::compile(attrs.string("xpath")?)?;
        let regex = compile_single_capture(attrs.string_or("regex", DEFAULT_VERSION_REGEX)?)?;
        Ok(Self { xpath, regex })
    }

    /// Evaluates the expression, which must select exactly one text-bearing
    /// node, and returns the regex capture of its text
    pub fn extract(&self, doc: &Document) -> Result<String, FetchError> {
        let item = match self.xpath.select(doc).as_slice() {
            [] => return Err(FetchError::NoVersionFound),
            [item] => *item,
            many => return Err(FetchError::AmbiguousQuery(many.len())),
        };

        let text = node_text(doc, item)?;
        self.regex
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(FetchError::RegexNoMatch)
    }
}

/// Text of a text or attribute node; an element is unwrapped when its first
/// child is text
fn node_text(doc: &Document, item: Item) -> Result<&str, FetchError> {
    match item {
        Item::Attr(id, index) => doc
            .attributes(id)
            .get(index)
            .map(|(_, value)| value.as_str())
            .ok_or(FetchError::UnexpectedNode("attribute")),
        Item::Node(id) => match doc.kind(id) {
            NodeKind::Text => Ok(doc.text(id)),
            NodeKind::Element => match doc.children(id).first() {
                Some(child) if doc.kind(*child) == NodeKind::Text => Ok(doc.text(*child)),
                _ => Err(FetchError::UnexpectedNode("element without text")),
            },
            NodeKind::Root => Err(FetchError::UnexpectedNode("document")),
        },
    }
}
