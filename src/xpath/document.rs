//! Node tree the XPath evaluator walks
//!
//! Nodes live in an arena and are appended in pre-order, so a node's id is
//! also its position in document order.

use scraper::Html;
use serde_json::Value;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element,
    Text,
}

/// A selected node, or one attribute of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    Node(NodeId),
    Attr(NodeId, usize),
}

impl Item {
    /// Sort key in document order; attributes follow their element
    pub(crate) fn order_key(self) -> (NodeId, usize) {
        match self {
            Item::Node(id) => (id, 0),
            Item::Attr(id, index) => (id, index + 1),
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            name: String::new(),
            attributes: Vec::new(),
            text: String::new(),
            parent,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Root, None)],
        }
    }
}

impl Document {
    /// Parses an HTML document. Comments, doctypes and whitespace-only text
    /// nodes are dropped.
    pub fn from_html(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut doc = Self::default();

        let mut stack: Vec<_> = html
            .tree
            .root()
            .children()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .map(|child| (child, doc.root()))
            .collect();

        while let Some((node, parent)) = stack.pop() {
            match node.value() {
                scraper::Node::Element(element) => {
                    let id = doc.push(parent, NodeKind::Element);
                    doc.nodes[id].name = element.name().to_string();
                    doc.nodes[id].attributes = element
                        .attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect();
                    let children: Vec<_> = node.children().collect();
                    stack.extend(children.into_iter().rev().map(|child| (child, id)));
                }
                scraper::Node::Text(text) => {
                    let text: &str = text;
                    if !text.trim().is_empty() {
                        doc.push_text(parent, text);
                    }
                }
                _ => {}
            }
        }

        doc
    }

    /// Maps a JSON value to a node tree: object members become elements
    /// named by their key, array items become unnamed elements and scalars
    /// become the text of their element. `null` yields an empty element.
    pub fn from_json(value: &Value) -> Self {
        let mut doc = Self::default();
        let mut stack: Vec<(&str, &Value, NodeId)> = Vec::new();

        let root = doc.root();
        doc.push_content(root, value, &mut stack);

        while let Some((name, value, parent)) = stack.pop() {
            let id = doc.push(parent, NodeKind::Element);
            doc.nodes[id].name = name.to_string();
            doc.push_content(id, value, &mut stack);
        }

        doc
    }

    fn push_content<'a>(
        &mut self,
        parent: NodeId,
        value: &'a Value,
        stack: &mut Vec<(&'a str, &'a Value, NodeId)>,
    ) {
        match value {
            Value::Object(members) => {
                stack.extend(members.iter().rev().map(|(k, v)| (k.as_str(), v, parent)));
            }
            Value::Array(items) => {
                stack.extend(items.iter().rev().map(|v| ("", v, parent)));
            }
            Value::String(s) => self.push_text(parent, s),
            Value::Number(n) => self.push_text(parent, &n.to_string()),
            Value::Bool(b) => self.push_text(parent, if *b { "true" } else { "false" }),
            Value::Null => {}
        }
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NodeData::new(kind, Some(parent)));
        self.nodes[parent].children.push(id);
        id
    }

    fn push_text(&mut self, parent: NodeId, text: &str) {
        let id = self.push(parent, NodeKind::Text);
        self.nodes[id].text = text.to_string();
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    /// Element name; empty for the root, text nodes and JSON array items
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id].name
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        &self.nodes[id].attributes
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id].text
    }

    /// `id` followed by all of its descendants in document order
    pub(crate) fn descendants_or_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current].children.iter().rev());
        }
        out
    }

    /// XPath string-value: attribute value, text content, or the
    /// concatenated text of all descendants
    pub fn string_value(&self, item: Item) -> String {
        match item {
            Item::Attr(id, index) => self.nodes[id]
                .attributes
                .get(index)
                .map(|(_, v)| v.clone())
                .unwrap_or_default(),
            Item::Node(id) => self
                .descendants_or_self(id)
                .into_iter()
                .filter(|n| self.nodes[*n].kind == NodeKind::Text)
                .map(|n| self.nodes[n].text.as_str())
                .collect(),
        }
    }
}
