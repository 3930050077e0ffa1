//! Scope values seen by Variable and Section evaluation.
//!
//! A scope is usually plain data decoded from JSON, but once a compiled
//! template is used as a component its scope is the computed props of the
//! calling element, which may carry rendered nodes (`children`) and opaque
//! callables (event handlers) alongside data.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::host::VNode;

/// An opaque callable passed through props untouched (e.g. `onClick` handlers).
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    call: Arc<dyn Fn(&[Value]) -> Value + Send + Sync>,
}

impl Function {
    pub fn new<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            call: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.call)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.name).finish()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// A key that is not present in scope.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Value>),
    Struct(IndexMap<String, Value>),
    Node(VNode),
    Function(Function),
}

impl Value {
    /// Property lookup; only structs have properties.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Best-effort JSON view, used for diagnostics and CLI output.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(n.clone()),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Struct(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Node(_) => JsonValue::String(self.to_string()),
        }
    }

    /// Convert a value in child position into virtual nodes.
    ///
    /// Nil, undefined, booleans and callables render nothing; lists are
    /// flattened; scalars become text.
    pub fn into_vnodes(self, out: &mut Vec<VNode>) {
        match self {
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Function(_) => {}
            Value::String(s) => out.push(VNode::Text(s)),
            Value::Node(node) => out.push(node),
            Value::List(items) => {
                for item in items {
                    item.into_vnodes(out);
                }
            }
            other @ (Value::Number(_) | Value::Struct(_)) => out.push(VNode::Text(other.to_string())),
        }
    }
}

/// Stringification following the host rendering convention: missing values
/// read `undefined`, lists join their items with `,`, structs are opaque.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    write!(f, "{i}")
                } else if let Some(u) = n.as_u64() {
                    write!(f, "{u}")
                } else {
                    f.write_str(&format_float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !matches!(item, Value::Undefined | Value::Null) {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Struct(_) | Value::Node(_) => f.write_str("[object Object]"),
            Value::Function(func) => write!(f, "function {}()", func.name()),
        }
    }
}

/// Shortest round-trip digits; exponent form outside `[1e-6, 1e21)`, written
/// `1e+21` / `1.5e-7`.
fn format_float(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) && magnitude.is_finite() {
        let exp = format!("{n:e}");
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        };
    }
    // Display never uses an exponent and drops a trailing `.0`
    n.to_string()
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(fields) => Value::Struct(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(i.into())
    }
}

impl From<VNode> for Value {
    fn from(node: VNode) -> Self {
        Value::Node(node)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Struct(iter.into_iter().collect())
    }
}
