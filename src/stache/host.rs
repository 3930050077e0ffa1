//! Virtual-element tree and the host tree-construction contract.
//!
//! The render compiler never builds tree nodes itself: every element and
//! fragment goes through a [`Host`], so callers can plug in their own
//! construction (or key) policy. [`VirtualDom`] is the default host and
//! produces plain [`VNode`] values.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::value::Value;
use crate::error::Result;

/// Computed element properties, in declaration order.
pub type Props = IndexMap<String, Value>;

/// A named render function taking a props/scope value.
///
/// Used both for caller-registered components and for compiled templates.
#[derive(Clone)]
pub struct Component {
    name: Arc<str>,
    render: Arc<dyn Fn(&Value) -> Result<VNode> + Send + Sync>,
}

impl Component {
    pub fn new<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<VNode> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            render: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, props: &Value) -> Result<VNode> {
        (self.render)(props)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.render, &other.render)
    }
}

/// What an element resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// An opaque host tag, e.g. `div`.
    Host(String),
    /// A compiled template, rendered when the tree is resolved.
    Component(Component),
}

#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Text(String),
    Element {
        tag: String,
        key: Option<String>,
        props: Props,
        children: Vec<VNode>,
    },
    /// A deferred component invocation.
    Component {
        component: Component,
        key: Option<String>,
        props: Props,
        children: Vec<VNode>,
    },
    Fragment(Vec<VNode>),
}

impl VNode {
    pub fn element(tag: impl Into<String>, props: Props, children: Vec<VNode>) -> Self {
        VNode::Element {
            tag: tag.into(),
            key: None,
            props,
            children,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Element { key, .. } | VNode::Component { key, .. } => key.as_deref(),
            VNode::Text(_) | VNode::Fragment(_) => None,
        }
    }

    /// Set the key on keyed nodes; text and fragments are left alone.
    pub fn set_key(&mut self, new_key: String) {
        match self {
            VNode::Element { key, .. } | VNode::Component { key, .. } => *key = Some(new_key),
            VNode::Text(_) | VNode::Fragment(_) => {}
        }
    }

    /// Expand every deferred component into the tree it renders.
    pub fn resolve(&self) -> Result<VNode> {
        match self {
            VNode::Text(_) => Ok(self.clone()),
            VNode::Element {
                tag,
                key,
                props,
                children,
            } => Ok(VNode::Element {
                tag: tag.clone(),
                key: key.clone(),
                props: props.clone(),
                children: resolve_all(children)?,
            }),
            VNode::Component {
                component,
                props,
                children,
                ..
            } => component.call(&component_props(props, children))?.resolve(),
            VNode::Fragment(children) => Ok(VNode::Fragment(resolve_all(children)?)),
        }
    }

    /// Concatenated text of the resolved tree, ignoring markup.
    pub fn text_content(&self) -> Result<String> {
        fn collect(node: &VNode, out: &mut String) {
            match node {
                VNode::Text(s) => out.push_str(s),
                VNode::Element { children, .. }
                | VNode::Component { children, .. }
                | VNode::Fragment(children) => children.iter().for_each(|c| collect(c, out)),
            }
        }
        let mut out = String::new();
        collect(&self.resolve()?, &mut out);
        Ok(out)
    }
}

fn resolve_all(nodes: &[VNode]) -> Result<Vec<VNode>> {
    nodes.iter().map(VNode::resolve).collect()
}

/// Props handed to a component: the computed props plus `children` when any
/// children were produced.
pub fn component_props(props: &Props, children: &[VNode]) -> Value {
    let mut scope = props.clone();
    if !children.is_empty() {
        scope.insert(
            "children".to_string(),
            Value::List(children.iter().cloned().map(Value::Node).collect()),
        );
    }
    Value::Struct(scope)
}

/// Rendered nodes found under a props value's `children` key.
pub fn children_of(props: &Value) -> Vec<VNode> {
    let mut out = Vec::new();
    if let Some(children) = props.get("children") {
        children.clone().into_vnodes(&mut out);
    }
    out
}

/// Tree-construction primitives supplied by the rendering library.
pub trait Host: Send + Sync {
    fn create_element(&self, tag: Tag, props: Props, children: Vec<VNode>) -> VNode;

    fn create_fragment(&self, children: Vec<VNode>) -> VNode;

    /// Key for a node at `position` in its parent's final child list.
    fn create_key(&self, position: usize) -> String {
        position.to_string()
    }
}

/// Default host producing plain [`VNode`] trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualDom;

impl Host for VirtualDom {
    fn create_element(&self, tag: Tag, props: Props, children: Vec<VNode>) -> VNode {
        match tag {
            Tag::Host(tag) => VNode::Element {
                tag,
                key: None,
                props,
                children,
            },
            Tag::Component(component) => VNode::Component {
                component,
                key: None,
                props,
                children,
            },
        }
    }

    fn create_fragment(&self, children: Vec<VNode>) -> VNode {
        VNode::Fragment(children)
    }
}

/// Turn rendered values into child nodes, keyed by position.
pub fn keyed_children(host: &dyn Host, values: Vec<Value>) -> Vec<VNode> {
    let mut nodes = Vec::with_capacity(values.len());
    for value in values {
        value.into_vnodes(&mut nodes);
    }
    for (position, node) in nodes.iter_mut().enumerate() {
        if matches!(node, VNode::Element { key: None, .. } | VNode::Component { key: None, .. }) {
            node.set_key(host.create_key(position));
        }
    }
    nodes
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn anchor() -> Component {
        Component::new("anchor", |props| {
            let mut attrs = Props::new();
            attrs.insert("href".into(), Value::from("#"));
            Ok(VNode::element("a", attrs, children_of(props)))
        })
    }

    #[test]
    fn keys_follow_position() {
        let host = VirtualDom;
        let nodes = keyed_children(
            &host,
            vec![
                Value::from("text"),
                Value::Node(VNode::element("b", Props::new(), vec![])),
                Value::Node(VNode::element("i", Props::new(), vec![])),
            ],
        );
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].key(), None);
        assert_eq!(nodes[1].key(), Some("1"));
        assert_eq!(nodes[2].key(), Some("2"));
    }

    #[test]
    fn existing_keys_are_kept() {
        let mut node = VNode::element("b", Props::new(), vec![]);
        node.set_key("mine".into());
        let nodes = keyed_children(&VirtualDom, vec![Value::Node(node)]);
        assert_eq!(nodes[0].key(), Some("mine"));
    }

    #[test]
    fn resolve_expands_components() {
        let host = VirtualDom;
        let deferred = host.create_element(
            Tag::Component(anchor()),
            Props::new(),
            vec![VNode::Text("hi".into())],
        );
        let resolved = deferred.resolve().unwrap();
        let VNode::Element { tag, children, .. } = resolved else {
            panic!("expected an element");
        };
        assert_eq!(tag, "a");
        assert_eq!(children, vec![VNode::Text("hi".into())]);
    }

    #[test]
    fn component_props_only_carry_nonempty_children() {
        let props = component_props(&Props::new(), &[]);
        assert_eq!(props.get("children"), None);
        let props = component_props(&Props::new(), &[VNode::Text("x".into())]);
        assert_eq!(children_of(&props), vec![VNode::Text("x".into())]);
    }

    #[test]
    fn text_content_walks_resolved_tree() {
        let tree = VNode::Fragment(vec![
            VNode::Text("a".into()),
            VNode::element("b", Props::new(), vec![VNode::Text("c".into())]),
        ]);
        assert_eq!(tree.text_content().unwrap(), "ac");
    }
}
