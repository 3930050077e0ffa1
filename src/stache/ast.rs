//! Node types for decoded tag-trees.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use ts_rs::TS;

/// Numeric ids of the non-element forms in the array notation.
pub const SECTION_ID: u8 = 2;
pub const VARIABLE_ID: u8 = 3;
pub const INVERTED_SECTION_ID: u8 = 4;
pub const COMMENT_ID: u8 = 5;

/// One decoded tag-tree node. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "type")]
#[ts(export)]
pub enum Node {
    Text {
        content: String,
    },
    /// Kept in the tree, never rendered.
    Comment {
        content: String,
    },
    Variable {
        name: String,
    },
    Section {
        name: String,
        children: Vec<Node>,
    },
    InvertedSection {
        name: String,
        children: Vec<Node>,
    },
    Element {
        name: String,
        /// Each binding is a short node list, evaluated and joined at render time.
        props: IndexMap<String, Vec<Node>>,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text {
            content: content.into(),
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Node::Comment {
            content: content.into(),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Node::Variable { name: name.into() }
    }

    pub fn section(name: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Section {
            name: name.into(),
            children,
        }
    }

    pub fn inverted_section(name: impl Into<String>, children: Vec<Node>) -> Self {
        Node::InvertedSection {
            name: name.into(),
            children,
        }
    }

    pub fn element(
        name: impl Into<String>,
        props: IndexMap<String, Vec<Node>>,
        children: Vec<Node>,
    ) -> Self {
        Node::Element {
            name: name.into(),
            props,
            children,
        }
    }

    /// Element without props or children.
    pub fn leaf(name: impl Into<String>) -> Self {
        Node::element(name, IndexMap::new(), Vec::new())
    }

    /// Child nodes (not prop bindings).
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Section { children, .. }
            | Node::InvertedSection { children, .. }
            | Node::Element { children, .. } => children,
            Node::Text { .. } | Node::Comment { .. } | Node::Variable { .. } => &[],
        }
    }

    /// Pre-order walk over this node and its children, skipping prop bindings.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Encode back into the array notation. `decode(node.to_raw())` yields `node`
    /// for every decoded node.
    pub fn to_raw(&self) -> JsonValue {
        match self {
            Node::Text { content } => JsonValue::String(content.clone()),
            Node::Comment { content } => json!([COMMENT_ID, content]),
            Node::Variable { name } => json!([VARIABLE_ID, name]),
            Node::Section { name, children } => json!([SECTION_ID, name, raw_forest(children)]),
            Node::InvertedSection { name, children } => {
                json!([INVERTED_SECTION_ID, name, raw_forest(children)])
            }
            Node::Element {
                name,
                props,
                children,
            } => {
                let props: serde_json::Map<String, JsonValue> = props
                    .iter()
                    .map(|(k, v)| (k.clone(), raw_forest(v)))
                    .collect();
                json!([name, props, raw_forest(children)])
            }
        }
    }
}

fn raw_forest(nodes: &[Node]) -> JsonValue {
    JsonValue::Array(nodes.iter().map(Node::to_raw).collect())
}

/// A named top-level tag-tree. `roots` are the children of the implicit
/// element named after the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub name: String,
    pub roots: Vec<Node>,
}

impl Template {
    pub fn new(name: impl Into<String>, roots: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            roots,
        }
    }
}
