//! Render compiler: turns sorted templates into render closures.
//!
//! Templates are compiled leaves-first. Each compiled template is added to
//! the index before the next one is compiled, so dependents can reference it
//! as a component by name. The last template in the order is the root.
//!
//! Every node compiles to a [`Render`] closure from a scope to a list of
//! values: strings for text, [`VNode`]s for elements, and raw scope values
//! for variables bound into props. Closures own everything they need, so a
//! [`Layout`] can be shared across threads and rendered concurrently.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::ast::{Node, Template};
use super::host::{component_props, keyed_children, Component, Props, Tag, VNode};
use super::html::is_input_tag;
use super::markup;
use super::style::parse_style;
use super::types::Kind;
use super::value::Value;
use crate::config::{RenderConfig, SectionPolicy};
use crate::error::{Result, StacheError};

/// Compiled render function for one node (or node list).
pub type Render = Arc<dyn Fn(&Value) -> Result<Vec<Value>> + Send + Sync>;

/// Where a node is being compiled.
#[derive(Debug, Clone, Copy)]
enum Context<'a> {
    Child,
    /// Inside the binding of `prop`.
    Prop { prop: &'a str },
}

/// A compiled property binding on an element.
struct PropBinding {
    /// Final prop name after renames.
    name: String,
    nodes: Vec<Render>,
    /// A bare binding means `true` rather than `""`; one that renders
    /// nothing leaves the prop out.
    boolean: bool,
    /// Single string results that read as integers become numbers.
    coerce: bool,
    /// String results are converted to a style map.
    style: bool,
}

/// What an element renders as, decided at compile time.
enum Target {
    Registry(Component),
    Template(Component),
    Host(String),
    /// Unknown name: the children are spliced into the parent.
    Fragment,
}

/// The compiled set of templates.
pub struct Layout {
    components: IndexMap<String, Component>,
    root: Component,
    config: Arc<RenderConfig>,
}

impl std::fmt::Debug for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .field("root", &self.root.name())
            .finish_non_exhaustive()
    }
}

impl Layout {
    /// The last template in compile order.
    pub fn root(&self) -> &Component {
        &self.root
    }

    /// A non-root compiled template.
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render the root template against `scope`. Templates used as elements
    /// stay deferred in the result; see [`VNode::resolve`].
    pub fn render(&self, scope: &Value) -> Result<VNode> {
        self.root.call(scope)
    }

    /// Render the root template and serialize it as static markup.
    pub fn render_markup(&self, scope: &Value) -> Result<String> {
        markup::to_markup(&self.render(scope)?, &self.config)
    }
}

/// Compile templates given in dependency order (see
/// [`build_order`](super::graph::build_order)).
pub fn compile(sorted: &[&Template], config: &RenderConfig) -> Result<Layout> {
    let Some((last, rest)) = sorted.split_last() else {
        return Err(StacheError::decode("no templates to compile"));
    };
    let mut compiler = Compiler {
        config: Arc::new(config.clone()),
        index: IndexMap::with_capacity(rest.len()),
    };
    for template in rest {
        let component = compiler.compile_template(template)?;
        compiler.index.insert(template.name.clone(), component);
    }
    let root = compiler.compile_template(last)?;
    debug!(
        root = %last.name,
        components = compiler.index.len(),
        "compiled layout"
    );
    Ok(Layout {
        components: compiler.index,
        root,
        config: compiler.config,
    })
}

struct Compiler {
    config: Arc<RenderConfig>,
    index: IndexMap<String, Component>,
}

impl Compiler {
    fn compile_template(&self, template: &Template) -> Result<Component> {
        let body = sequence(self.compile_nodes(&template.roots, Context::Child)?);
        let host = Arc::clone(&self.config.host);
        trace!(template = %template.name, "compiled template");
        Ok(Component::new(template.name.as_str(), move |scope| {
            let values = body(scope)?;
            Ok(host.create_fragment(keyed_children(&*host, values)))
        }))
    }

    fn compile_nodes(&self, nodes: &[Node], ctx: Context<'_>) -> Result<Vec<Render>> {
        let mut renders = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Some(render) = self.compile_node(node, ctx)? {
                renders.push(render);
            }
        }
        Ok(renders)
    }

    /// `None` for nodes that never render (comments).
    fn compile_node(&self, node: &Node, ctx: Context<'_>) -> Result<Option<Render>> {
        let render: Render = match node {
            Node::Comment { .. } => return Ok(None),
            Node::Text { content } => {
                let text = Value::String(content.clone());
                Arc::new(move |_: &Value| -> Result<Vec<Value>> { Ok(vec![text.clone()]) })
            }
            Node::Variable { name } => compile_variable(name, ctx),
            Node::Section { name, children } => {
                let body = sequence(self.compile_nodes(children, ctx)?);
                compile_section(name, self.config.section_policy, body)
            }
            Node::InvertedSection { name, children } => {
                let body = sequence(self.compile_nodes(children, ctx)?);
                compile_inverted_section(name, self.config.section_policy, body)
            }
            Node::Element {
                name,
                props,
                children,
            } => {
                if let Context::Prop { prop } = ctx {
                    return Err(StacheError::PropElement {
                        element: name.clone(),
                        prop: prop.to_string(),
                    });
                }
                self.compile_element(name, props, children)?
            }
        };
        Ok(Some(render))
    }

    /// Children are evaluated against the current scope for every target,
    /// registry components and templates included. This departs from
    /// runtimes that evaluate component children against the computed props;
    /// a component sees its children only as the rendered `children` prop.
    fn compile_element(
        &self,
        name: &str,
        props: &IndexMap<String, Vec<Node>>,
        children: &[Node],
    ) -> Result<Render> {
        let config = &self.config;
        let is_extern = config.is_extern(name);
        let bindings = props
            .iter()
            .map(|(prop, nodes)| self.compile_prop(name, is_extern, prop, nodes))
            .collect::<Result<Vec<_>>>()?;

        // Void tags keep their props but never evaluate children.
        let body = if config.is_self_closing(name) {
            None
        } else {
            Some(sequence(self.compile_nodes(children, Context::Child)?))
        };

        let target = if let Some(component) = config.registry.get(name) {
            Target::Registry(component.clone())
        } else if let Some(component) = self.index.get(name) {
            Target::Template(component.clone())
        } else if is_extern {
            Target::Host(name.to_string())
        } else {
            trace!(element = name, "unresolved element renders as a fragment");
            Target::Fragment
        };

        let host = Arc::clone(&config.host);
        Ok(Arc::new(move |scope: &Value| -> Result<Vec<Value>> {
            let values = match &body {
                Some(body) => body(scope)?,
                None => Vec::new(),
            };
            let node = match &target {
                Target::Fragment => return Ok(values),
                Target::Registry(component) => {
                    let props = render_props(&bindings, scope)?;
                    let children = keyed_children(&*host, values);
                    component.call(&component_props(&props, &children))?
                }
                Target::Template(component) => host.create_element(
                    Tag::Component(component.clone()),
                    render_props(&bindings, scope)?,
                    keyed_children(&*host, values),
                ),
                Target::Host(tag) => host.create_element(
                    Tag::Host(tag.clone()),
                    render_props(&bindings, scope)?,
                    keyed_children(&*host, values),
                ),
            };
            Ok(vec![Value::Node(node)])
        }))
    }

    fn compile_prop(
        &self,
        element: &str,
        is_extern: bool,
        prop: &str,
        nodes: &[Node],
    ) -> Result<PropBinding> {
        let input = is_input_tag(element);
        let renamed = if is_extern {
            self.config.extern_props.get(prop).map_or(prop, String::as_str)
        } else {
            prop
        };
        let name = match renamed {
            "class" => "className",
            "for" => "htmlFor",
            "checked" if input => "defaultChecked",
            "value" if input => "defaultValue",
            other => self.config.synthetic_event(other).unwrap_or(other),
        };
        Ok(PropBinding {
            name: name.to_string(),
            nodes: self.compile_nodes(nodes, Context::Prop { prop })?,
            boolean: self.config.is_boolean_attribute(prop),
            coerce: !(input && matches!(prop, "checked" | "value")),
            style: is_extern && prop == "style",
        })
    }
}

fn compile_variable(name: &str, ctx: Context<'_>) -> Render {
    let name = name.to_string();
    // Props and `children` see the raw value so nodes, lists and callables
    // survive; everywhere else the value is stringified.
    let raw = matches!(ctx, Context::Prop { .. }) || name == "children";
    Arc::new(move |scope: &Value| -> Result<Vec<Value>> {
        let value = scope.get(&name).cloned().unwrap_or_default();
        Ok(vec![if raw {
            value
        } else {
            Value::String(value.to_string())
        }])
    })
}

fn compile_section(name: &str, policy: SectionPolicy, body: Render) -> Render {
    let name = name.to_string();
    Arc::new(move |scope: &Value| -> Result<Vec<Value>> {
        match scope.get(&name) {
            None | Some(Value::Undefined | Value::Null | Value::Bool(false)) => Ok(Vec::new()),
            Some(Value::Bool(true)) => body(scope),
            Some(Value::List(items)) => {
                let mut out = Vec::new();
                for item in items {
                    let item_scope = if matches!(item, Value::Bool(true)) {
                        scope
                    } else {
                        item
                    };
                    for value in body(item_scope)? {
                        push_coalesced(&mut out, value);
                    }
                }
                Ok(out)
            }
            Some(value @ Value::Struct(_)) => body(value),
            Some(other) => match policy {
                SectionPolicy::Lenient => body(scope),
                SectionPolicy::Strict => Err(invalid_section(&name, other)),
            },
        }
    })
}

fn compile_inverted_section(name: &str, policy: SectionPolicy, body: Render) -> Render {
    let name = name.to_string();
    Arc::new(move |scope: &Value| -> Result<Vec<Value>> {
        match scope.get(&name) {
            None | Some(Value::Undefined | Value::Null | Value::Bool(false)) => body(scope),
            Some(Value::List(items)) if items.is_empty() => body(scope),
            Some(Value::Bool(true) | Value::List(_) | Value::Struct(_)) => Ok(Vec::new()),
            Some(other) => match policy {
                SectionPolicy::Lenient => Ok(Vec::new()),
                SectionPolicy::Strict => Err(invalid_section(&name, other)),
            },
        }
    })
}

fn invalid_section(name: &str, found: &Value) -> StacheError {
    StacheError::InvalidSectionValue {
        section: name.to_string(),
        found: found.describe(),
    }
}

/// Run renders in order, merging adjacent strings.
fn sequence(renders: Vec<Render>) -> Render {
    Arc::new(move |scope: &Value| -> Result<Vec<Value>> {
        let mut out = Vec::new();
        for render in &renders {
            for value in render(scope)? {
                push_coalesced(&mut out, value);
            }
        }
        Ok(out)
    })
}

fn push_coalesced(out: &mut Vec<Value>, value: Value) {
    if let (Value::String(next), Some(Value::String(prev))) = (&value, out.last_mut()) {
        prev.push_str(next);
        return;
    }
    out.push(value);
}

fn render_props(bindings: &[PropBinding], scope: &Value) -> Result<Props> {
    let mut props = Props::with_capacity(bindings.len());
    for binding in bindings {
        if binding.nodes.is_empty() {
            let bare = if binding.boolean {
                Value::Bool(true)
            } else {
                Value::String(String::new())
            };
            props.insert(binding.name.clone(), bare);
            continue;
        }
        let mut results = Vec::new();
        for render in &binding.nodes {
            results.extend(render(scope)?);
        }
        let value = match results.len() {
            // a binding whose nodes rendered nothing leaves boolean attributes unset
            0 if binding.boolean => continue,
            0 => Value::String(String::new()),
            1 => {
                let value = results.pop().unwrap_or_default();
                match value {
                    Value::String(css) if binding.style => parse_style(&css)
                        .into_iter()
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect(),
                    value if binding.coerce => coerce_integer(value),
                    value => value,
                }
            }
            _ => Value::String(results.iter().map(ToString::to_string).collect()),
        };
        props.insert(binding.name.clone(), value);
    }
    Ok(props)
}

/// `"42"` → `42`; anything else is returned as is.
fn coerce_integer(value: Value) -> Value {
    if let Value::String(s) = &value {
        if let Ok(n) = s.trim().parse::<i64>() {
            return Value::from(n);
        }
    }
    value
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use serde_json::{json, Value as JsonValue};

    use super::*;
    use crate::stache::decode::decode_templates;
    use crate::stache::graph::build_order;
    use crate::stache::host::children_of;

    fn layout(raw: &[JsonValue], config: &RenderConfig) -> Layout {
        let templates = decode_templates(raw).unwrap();
        let order = build_order(&templates, &config.externs).unwrap();
        compile(&order, config).unwrap()
    }

    fn markup(raw: &[JsonValue], scope: JsonValue) -> String {
        layout(raw, &RenderConfig::default())
            .render_markup(&Value::from(scope))
            .unwrap()
    }

    /// Props of the single element the root renders.
    fn root_props(raw: JsonValue, scope: JsonValue) -> Props {
        let tree = layout(&[raw], &RenderConfig::default())
            .render(&Value::from(scope))
            .unwrap();
        let VNode::Fragment(children) = tree else {
            panic!("expected a fragment");
        };
        let VNode::Element { props, .. } = &children[0] else {
            panic!("expected an element");
        };
        props.clone()
    }

    #[test]
    fn test_section_iterates_lists() {
        let raw = json!(["foo", {}, [["ul", {}, [[2, "items", [["li", {}, [[3, "name"]]]]]]]]]);
        let scope = json!({"items": [{"name": "Apple"}, {"name": "Orange"}]});
        assert_eq!(markup(&[raw], scope), "<ul><li>Apple</li><li>Orange</li></ul>");
    }

    #[test]
    fn test_section_values() {
        let raw = json!(["foo", {}, [[2, "s", ["[", [3, "x"], "]"]]]]);
        let render = |scope| markup(&[raw.clone()], scope);
        assert_eq!(render(json!({"s": true, "x": 1})), "[1]");
        assert_eq!(render(json!({"s": false, "x": 1})), "");
        assert_eq!(render(json!({"x": 1})), "");
        assert_eq!(render(json!({"s": null, "x": 1})), "");
        assert_eq!(render(json!({"s": [], "x": 1})), "");
        assert_eq!(render(json!({"s": {"x": 2}, "x": 1})), "[2]");
        assert_eq!(render(json!({"s": [{"x": 2}, true], "x": 1})), "[2][1]");
        // scalar items have no properties
        assert_eq!(render(json!({"s": [7], "x": 1})), "[undefined]");
        // other scalars fall through to the outer scope
        assert_eq!(render(json!({"s": "yes", "x": 1})), "[1]");
        assert_eq!(render(json!({"s": 0, "x": 1})), "[1]");
    }

    #[test]
    fn test_strict_sections_reject_scalars() {
        let raw = json!(["foo", {}, [[2, "s", ["x"]]]]);
        let config = RenderConfig::default().with_section_policy(SectionPolicy::Strict);
        let layout = layout(&[raw], &config);
        let err = layout.render(&Value::from(json!({"s": "yes"}))).unwrap_err();
        assert_eq!(
            err,
            StacheError::InvalidSectionValue {
                section: "s".into(),
                found: "\"yes\"".into()
            }
        );
        assert!(layout.render(&Value::from(json!({"s": true}))).is_ok());
    }

    #[test]
    fn test_strict_inverted_sections_reject_scalars() {
        let raw = json!(["foo", {}, [[4, "s", ["x"]]]]);
        let config = RenderConfig::default().with_section_policy(SectionPolicy::Strict);
        let layout = layout(&[raw], &config);
        let err = layout.render(&Value::from(json!({"s": 0}))).unwrap_err();
        assert_eq!(
            err,
            StacheError::InvalidSectionValue {
                section: "s".into(),
                found: "0".into()
            }
        );
        let render = |scope| layout.render_markup(&Value::from(scope)).unwrap();
        assert_eq!(render(json!({"s": []})), "x");
        assert_eq!(render(json!({"s": false})), "x");
        assert_eq!(render(json!({"s": {}})), "");
    }

    #[test]
    fn test_inverted_section() {
        let raw = json!(["foo", {}, [[4, "x", ["shown"]]]]);
        let render = |scope| markup(&[raw.clone()], scope);
        assert_eq!(render(json!({})), "shown");
        assert_eq!(render(json!({"x": null})), "shown");
        assert_eq!(render(json!({"x": false})), "shown");
        assert_eq!(render(json!({"x": []})), "shown");
        assert_eq!(render(json!({"x": true})), "");
        assert_eq!(render(json!({"x": [1]})), "");
        assert_eq!(render(json!({"x": {}})), "");
        assert_eq!(render(json!({"x": "s"})), "");
    }

    #[test]
    fn test_inverted_section_keeps_outer_scope() {
        let raw = json!(["foo", {}, [[4, "x", [[3, "y"]]]]]);
        assert_eq!(markup(&[raw], json!({"x": [], "y": "outer"})), "outer");
    }

    #[test]
    fn test_variables_stringify_in_children() {
        let raw = json!(["foo", {}, [[3, "a"], "|", [3, "b"], "|", [3, "c"], "|", [3, "d"]]]);
        let scope = json!({"a": null, "c": [1, 2], "d": {"k": 1}});
        assert_eq!(markup(&[raw], scope), "null|undefined|1,2|[object Object]");
    }

    #[test]
    fn test_adjacent_strings_are_coalesced() {
        let raw = json!(["foo", {}, [["p", {}, ["a", [3, "x"], "c"]]]]);
        let tree = layout(&[raw], &RenderConfig::default())
            .render(&Value::from(json!({"x": "b"})))
            .unwrap();
        let VNode::Fragment(children) = tree else {
            panic!("expected a fragment");
        };
        let VNode::Element { children, .. } = &children[0] else {
            panic!("expected an element");
        };
        assert_eq!(children, &vec![VNode::Text("abc".into())]);
    }

    #[test]
    fn test_prop_values() {
        let raw = json!(["foo", {}, [["div", {
            "id": ["7"],
            "title": ["a", [3, "b"]],
            "hidden": [],
            "data-x": [],
            "class": ["big"],
            "for": ["name"],
            "onclick": [[3, "handler"]],
            "tabindex": ["1"]
        }, []]]]);
        let props = root_props(raw, json!({"b": 2, "handler": "h"}));
        assert_eq!(props["id"], Value::from(7));
        assert_eq!(props["title"], Value::from("a2"));
        assert_eq!(props["hidden"], Value::Bool(true));
        assert_eq!(props["data-x"], Value::from(""));
        assert_eq!(props["className"], Value::from("big"));
        assert_eq!(props["htmlFor"], Value::from("name"));
        assert_eq!(props["onClick"], Value::from("h"));
        assert_eq!(props["tabIndex"], Value::from(1));
    }

    #[test]
    fn test_sections_in_props() {
        let raw = json!(["foo", {}, [["input", {
            "disabled": [[2, "off", ["x"]]],
            "title": [[2, "t", ["a"]]]
        }, []]]]);
        let props = root_props(raw.clone(), json!({"off": false}));
        assert_eq!(props.get("disabled"), None);
        assert_eq!(props["title"], Value::from(""));
        assert_eq!(markup(&[raw.clone()], json!({"off": false})), r#"<input title=""/>"#);
        assert_eq!(
            markup(&[raw], json!({"off": true, "t": true})),
            r#"<input disabled="" title="a"/>"#
        );
    }

    #[test]
    fn test_input_props_are_uncontrolled() {
        let raw = json!(["foo", {}, [["input", {"value": ["42"], "checked": [], "size": ["3"]}, []]]]);
        let props = root_props(raw, json!({}));
        assert_eq!(props["defaultValue"], Value::from("42"));
        assert_eq!(props["defaultChecked"], Value::Bool(true));
        assert_eq!(props["size"], Value::from(3));
    }

    #[test]
    fn test_props_pass_raw_values() {
        let raw = json!(["foo", {}, [["div", {"data-items": [[3, "items"]], "data-none": [[3, "none"]]}, []]]]);
        let props = root_props(raw, json!({"items": [1, 2]}));
        assert_eq!(props["data-items"], Value::from(json!([1, 2])));
        assert_eq!(props["data-none"], Value::Undefined);
    }

    #[test]
    fn test_style_string_becomes_map() {
        let raw = json!(["foo", {}, [["div", {"style": ["color: red; font-size: 2px"]}, []]]]);
        let props = root_props(raw, json!({}));
        assert_eq!(
            props["style"],
            Value::from(json!({"color": "red", "fontSize": "2px"}))
        );
    }

    #[test]
    fn test_elements_in_props_are_rejected() {
        let templates = decode_templates(&[json!(["foo", {}, [["div", {"title": [[2, "s", [["b", {}, []]]]]}, []]]])]).unwrap();
        let order = build_order(&templates, &RenderConfig::default().externs).unwrap();
        let err = compile(&order, &RenderConfig::default()).unwrap_err();
        assert_eq!(
            err,
            StacheError::PropElement {
                element: "b".into(),
                prop: "title".into()
            }
        );
    }

    #[test]
    fn test_self_closing_tags_drop_children() {
        let raw = json!(["foo", {}, [["br", {}, ["ignored", [3, "x"]]]]]);
        assert_eq!(markup(&[raw], json!({})), "<br/>");
    }

    #[test]
    fn test_unknown_element_is_a_fragment() {
        let raw = json!(["foo", {}, [["mystery", {"a": ["b"]}, ["x"]]]]);
        assert_eq!(markup(&[raw], json!({})), "x");
    }

    #[test]
    fn test_templates_as_components() {
        let list = json!(["list", {}, [["ul", {}, [[3, "children"]]]]]);
        let item = json!(["listitem", {}, [["li", {}, [[3, "text"]]]]]);
        let main = json!(["main", {}, [
            ["h2", {}, ["Fruits"]],
            ["list", {}, [[2, "fruits", [["listitem", {"text": [[3, "name"]]}, []]]]]]
        ]]);
        let scope = json!({"fruits": [{"name": "Apple"}, {"name": "Orange"}]});
        let layout = layout(&[list, item, main], &RenderConfig::default());
        assert_eq!(layout.root().name(), "main");
        assert!(layout.component("list").is_some());
        assert!(layout.component("main").is_none());
        assert_eq!(
            layout.render_markup(&Value::from(scope)).unwrap(),
            "<h2>Fruits</h2><ul><li>Apple</li><li>Orange</li></ul>"
        );
    }

    #[test]
    fn test_registry_wins_over_templates() {
        let config = RenderConfig::default().with_component("card", |props| {
            let mut attrs = Props::new();
            attrs.insert("title".into(), props.get("title").cloned().unwrap_or_default());
            Ok(VNode::element("section", attrs, children_of(props)))
        });
        let card = json!(["card", {}, ["template"]]);
        let main = json!(["main", {}, [["card", {"title": [[3, "t"]]}, [[3, "body"]]]]]);
        let layout = layout(&[card, main], &config);
        assert_eq!(
            layout
                .render_markup(&Value::from(json!({"t": "T", "body": "B"})))
                .unwrap(),
            r#"<section title="T">B</section>"#
        );
    }

    #[test]
    fn test_children_are_keyed_by_position() {
        let raw = json!(["foo", {}, ["a", ["b", {}, []], [2, "xs", [["i", {}, []]]]]]);
        let tree = layout(&[raw], &RenderConfig::default())
            .render(&Value::from(json!({"xs": [{}, {}]})))
            .unwrap();
        let VNode::Fragment(children) = tree else {
            panic!("expected a fragment");
        };
        let keys: Vec<_> = children.iter().map(VNode::key).collect();
        assert_eq!(keys, vec![None, Some("1"), Some("2"), Some("3")]);
    }

    #[test]
    fn test_comments_render_nothing() {
        let raw = json!(["foo", {}, ["a", [5, "note"], "b"]]);
        assert_eq!(markup(&[raw], json!({})), "ab");
    }

    #[test]
    fn test_empty_order_is_an_error() {
        assert!(compile(&[], &RenderConfig::default()).unwrap_err().is_decode());
    }
}
