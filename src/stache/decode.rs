//! Tag-tree decoder: raw array/string notation → [`Node`] trees.
//!
//! ```text
//! "text"                            → Text
//! [name, {prop: [raw..]}?, [raw..]?] → Element
//! [2, name, [raw..]?]               → Section
//! [3, name]                         → Variable
//! [4, name, [raw..]?]               → InvertedSection
//! [5, text]                         → Comment
//! ```
//!
//! Decoding is all-or-nothing: the first violated shape invariant aborts with
//! a [`StacheError::Decode`] naming the offending element, prop or section.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::ast::{Node, Template, COMMENT_ID, INVERTED_SECTION_ID, SECTION_ID, VARIABLE_ID};
use super::html::is_reserved_prop;
use super::types::{describe_slot, Kind};
use crate::error::{Result, StacheError};

pub fn decode(raw: &JsonValue) -> Result<Node> {
    match raw {
        JsonValue::String(s) => Ok(Node::text(s.clone())),
        JsonValue::Array(items) => decode_array(items),
        other => Err(StacheError::decode(format!(
            "expected an array or string, got {}",
            other.describe()
        ))),
    }
}

/// Decode a template: an element-form array whose name is the template name
/// and whose children are the template body.
pub fn decode_template(raw: &JsonValue) -> Result<Template> {
    match decode(raw)? {
        Node::Element { name, children, .. } => Ok(Template::new(name, children)),
        _ => Err(StacheError::decode(format!(
            "expected a template element, got {}",
            raw.describe()
        ))),
    }
}

pub fn decode_templates(raw: &[JsonValue]) -> Result<Vec<Template>> {
    let templates = raw.iter().map(decode_template).collect::<Result<Vec<_>>>()?;
    debug!(count = templates.len(), "decoded templates");
    Ok(templates)
}

fn decode_array(items: &[JsonValue]) -> Result<Node> {
    let Some(head) = items.first() else {
        return Err(StacheError::decode("expected a non-empty array"));
    };
    if let Some(name) = head.as_str() {
        return decode_element(name, items);
    }
    let id = head.as_integer().and_then(|id| u8::try_from(id).ok());
    match id {
        Some(SECTION_ID) => {
            let name = section_name(items)?;
            Ok(Node::section(name, section_children(name, items)?))
        }
        Some(INVERTED_SECTION_ID) => {
            let name = section_name(items)?;
            Ok(Node::inverted_section(name, section_children(name, items)?))
        }
        Some(VARIABLE_ID) => match items.get(1) {
            Some(JsonValue::String(name)) if !name.is_empty() => Ok(Node::variable(name.clone())),
            slot => Err(StacheError::decode(format!(
                "expected a non-empty string as variable name, got {}",
                describe_slot(slot)
            ))),
        },
        Some(COMMENT_ID) => match items.get(1) {
            Some(JsonValue::String(content)) => Ok(Node::comment(content.clone())),
            slot => Err(StacheError::decode(format!(
                "expected a string as comment, got {}",
                describe_slot(slot)
            ))),
        },
        _ => Err(StacheError::decode(format!(
            "expected a tag name or a valid id, got {}",
            head.describe()
        ))),
    }
}

fn decode_element(raw_name: &str, items: &[JsonValue]) -> Result<Node> {
    let name = raw_name.trim();
    if name.is_empty() {
        return Err(StacheError::decode("expected an element name, got empty string"));
    }

    let mut props = IndexMap::new();
    if let Some(raw_props) = items.get(1) {
        let JsonValue::Object(bindings) = raw_props else {
            return Err(StacheError::decode(format!(
                "{name}: expected a props object, got {}",
                raw_props.describe()
            )));
        };
        for (key, value) in bindings {
            if is_reserved_prop(key) {
                return Err(StacheError::decode(format!(
                    "{name} > {key}: reserved property name"
                )));
            }
            let JsonValue::Array(raw_nodes) = value else {
                return Err(StacheError::decode(format!(
                    "{name} > {key}: expected an array of child nodes, got {}",
                    value.describe()
                )));
            };
            // Bindings are not merged; each node is one result.
            let nodes = raw_nodes.iter().map(decode).collect::<Result<Vec<_>>>()?;
            props.insert(key.clone(), nodes);
        }
    }

    let children = match items.get(2) {
        None => Vec::new(),
        Some(JsonValue::Array(raw_children)) => decode_forest(raw_children)?,
        Some(other) => {
            return Err(StacheError::decode(format!(
                "{name}: expected an array of child nodes, got {}",
                other.describe()
            )))
        }
    };

    Ok(Node::element(name, props, children))
}

fn section_name(items: &[JsonValue]) -> Result<&str> {
    match items.get(1) {
        Some(JsonValue::String(name)) if !name.is_empty() => Ok(name),
        slot => Err(StacheError::decode(format!(
            "expected a non-empty string as section name, got {}",
            describe_slot(slot)
        ))),
    }
}

fn section_children(name: &str, items: &[JsonValue]) -> Result<Vec<Node>> {
    match items.get(2) {
        None => Ok(Vec::new()),
        Some(JsonValue::Array(raw_children)) => decode_forest(raw_children),
        Some(other) => Err(StacheError::decode(format!(
            "{name}: expected an array of child nodes, got {}",
            other.describe()
        ))),
    }
}

/// Decode a child list, merging adjacent Text nodes. A Comment between two
/// texts keeps them apart; render-time coalescing joins them once the
/// comment is dropped.
fn decode_forest(raw: &[JsonValue]) -> Result<Vec<Node>> {
    let mut out: Vec<Node> = Vec::with_capacity(raw.len());
    for item in raw {
        let node = decode(item)?;
        if let (Node::Text { content: next }, Some(Node::Text { content: prev })) =
            (&node, out.last_mut())
        {
            prev.push_str(next);
            continue;
        }
        out.push(node);
    }
    Ok(out)
}
