//! Static markup serialization of rendered trees.
//!
//! Output is canonical rather than pretty: no whitespace is added, void tags
//! are written `<br/>`, and attributes appear in prop order.

use indexmap::IndexMap;
use quick_xml::escape::escape;

use super::host::{component_props, VNode};
use super::html::{is_reserved_prop, MARKUP_ATTRIBUTE_NAMES};
use super::style::to_css_text;
use super::value::Value;
use crate::config::RenderConfig;
use crate::error::Result;

/// Serialize `node`, rendering deferred components on the way.
pub fn to_markup(node: &VNode, config: &RenderConfig) -> Result<String> {
    let mut out = String::new();
    write_node(node, config, &mut out)?;
    Ok(out)
}

fn write_node(node: &VNode, config: &RenderConfig, out: &mut String) -> Result<()> {
    match node {
        VNode::Text(text) => out.push_str(&escape(text.as_str())),
        VNode::Fragment(children) => {
            for child in children {
                write_node(child, config, out)?;
            }
        }
        VNode::Component {
            component,
            props,
            children,
            ..
        } => {
            let rendered = component.call(&component_props(props, children))?;
            write_node(&rendered, config, out)?;
        }
        VNode::Element {
            tag,
            props,
            children,
            ..
        } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in props {
                write_attribute(name, value, config, out);
            }
            if config.is_self_closing(tag) {
                out.push_str("/>");
                return Ok(());
            }
            out.push('>');
            for child in children {
                write_node(child, config, out)?;
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
    Ok(())
}

fn write_attribute(name: &str, value: &Value, config: &RenderConfig, out: &mut String) {
    if is_reserved_prop(name) || config.is_event_prop(name) {
        return;
    }
    let attribute = attribute_name(name, config);
    let text = if config.is_boolean_attribute(&attribute) {
        if !truthy(value) {
            return;
        }
        String::new()
    } else {
        match value {
            Value::Undefined | Value::Null | Value::Bool(false) | Value::Function(_) => return,
            Value::Bool(true) => String::new(),
            Value::Struct(fields) if name == "style" => {
                let style: IndexMap<String, String> = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .collect();
                to_css_text(&style)
            }
            other => other.to_string(),
        }
    };
    out.push(' ');
    out.push_str(&attribute);
    out.push_str("=\"");
    out.push_str(&escape(text.as_str()));
    out.push('"');
}

/// Markup attribute for a prop name: library renames first, then camel-cased
/// host renames back to their lower-case form.
fn attribute_name(name: &str, config: &RenderConfig) -> String {
    if let Some((_, attribute)) = MARKUP_ATTRIBUTE_NAMES.iter().find(|(from, _)| *from == name) {
        return (*attribute).to_string();
    }
    config
        .extern_props
        .iter()
        .find(|(_, to)| to.as_str() == name)
        .map_or_else(|| name.to_string(), |(from, _)| from.clone())
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null | Value::Bool(false) | Value::Function(_) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Bool(true) | Value::List(_) | Value::Struct(_) | Value::Node(_) => true,
    }
}
