pub mod ast;
pub mod compiler;
pub mod decode;
pub mod graph;
pub mod host;
pub mod html;
pub mod markup;
pub mod style;
pub mod types;
pub mod value;

use serde_json::Value as JsonValue;

use crate::config::RenderConfig;
use crate::error::Result;
use ast::Template;
use compiler::Layout;

/// Compile raw tag-tree templates into a [`Layout`].
///
/// This is the primary public entry point for the template pipeline:
/// raw templates → decode → dependency sort → compile → `Layout`
pub fn compile_layout(raw: &[JsonValue], config: &RenderConfig) -> Result<Layout> {
    let templates = decode::decode_templates(raw)?;
    compile_templates(&templates, config)
}

/// Same as [`compile_layout`] for templates that are already decoded (or
/// built by hand).
pub fn compile_templates(templates: &[Template], config: &RenderConfig) -> Result<Layout> {
    let order = graph::build_order(templates, &config.externs)?;
    compiler::compile(&order, config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::StacheError;
    use crate::stache::value::Value;

    #[test]
    fn test_pipeline_end_to_end() {
        let raw = [json!(["foo", {}, [["ul", {}, [[2, "items", [["li", {}, [[3, "name"]]]]]]]]])];
        let layout = compile_layout(&raw, &RenderConfig::default()).unwrap();
        let scope = Value::from(json!({"items": [{"name": "Apple"}, {"name": "Orange"}]}));
        assert_eq!(
            layout.render_markup(&scope).unwrap(),
            "<ul><li>Apple</li><li>Orange</li></ul>"
        );
    }

    #[test]
    fn test_decode_errors_abort_compile() {
        let raw = [json!(["foo", {}, [[]]])];
        let err = compile_layout(&raw, &RenderConfig::default()).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_cycles_abort_compile() {
        let raw = [json!(["a", {}, [["b", {}, []]]]), json!(["b", {}, [["a", {}, []]]])];
        let err = compile_layout(&raw, &RenderConfig::default()).unwrap_err();
        assert_eq!(err, StacheError::cyclic(["a", "b"]));
    }

    #[test]
    fn test_hand_built_templates() {
        let templates = [Template::new("t", vec![ast::Node::variable("x")])];
        let layout = compile_templates(&templates, &RenderConfig::bare()).unwrap();
        let tree = layout.render(&Value::from(json!({"x": "hi"}))).unwrap();
        assert_eq!(tree.text_content().unwrap(), "hi");
    }
}
